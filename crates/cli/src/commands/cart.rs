//! Cart commands.

use clap::Subcommand;
use rust_decimal::Decimal;
use verdant_core::{LineId, Money, ProductId, ProductSnapshot, VariantId};

use super::Engine;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product id
        #[arg(long)]
        product: String,
        /// Display title
        #[arg(long)]
        title: String,
        /// Unit price at add-time (e.g. 18.50)
        #[arg(long)]
        price: Decimal,
        /// Variant id, if the product has variants
        #[arg(long)]
        variant: Option<String>,
        /// Quantity
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Update a line's quantity (0 removes the line)
    Update {
        /// Line id
        #[arg(long)]
        line: String,
        /// New quantity
        #[arg(long)]
        quantity: u32,
    },
    /// Remove a line
    Remove {
        /// Line id
        #[arg(long)]
        line: String,
    },
    /// Clear the cart
    Clear,
    /// Apply a coupon code
    Coupon { code: String },
    /// Remove the applied coupon
    Uncoupon,
}

pub async fn run(engine: &Engine, action: CartAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CartAction::Show => show(engine).await,
        CartAction::Add {
            product,
            title,
            price,
            variant,
            quantity,
        } => {
            let snapshot = ProductSnapshot {
                product_id: ProductId::new(product),
                variant_id: variant.map(VariantId::new),
                title,
                unit_price: Money::new(price, verdant_core::CurrencyCode::USD),
            };
            let outcome = engine.cart.add(&snapshot, quantity).await;
            println!("{outcome}");
        }
        CartAction::Update { line, quantity } => {
            let outcome = engine
                .cart
                .update_quantity(&LineId::new(line), quantity)
                .await;
            println!("{outcome}");
        }
        CartAction::Remove { line } => {
            let outcome = engine.cart.remove(&LineId::new(line)).await;
            println!("{outcome}");
        }
        CartAction::Clear => {
            let outcome = engine.cart.clear().await;
            println!("{outcome}");
        }
        CartAction::Coupon { code } => {
            engine.cart.apply_coupon(&code).await?;
            println!("Coupon applied");
        }
        CartAction::Uncoupon => {
            engine.cart.remove_coupon().await?;
            println!("Coupon removed");
        }
    }
    Ok(())
}

async fn show(engine: &Engine) {
    let Some(cart) = engine.cart.snapshot().await else {
        println!("Cart is empty");
        return;
    };

    for line in &cart.lines {
        println!(
            "{}  x{}  {}  ({})",
            line.title, line.quantity, line.line_subtotal, line.id
        );
    }
    println!("Subtotal: {}", cart.subtotal);
    if !cart.discount.is_zero() {
        println!("Discount: -{}", cart.discount);
    }
    println!("Total:    {}  [{:?}]", cart.total, engine.cart.sync_state().await);
}
