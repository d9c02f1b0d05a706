//! Wishlist commands.

use clap::Subcommand;
use rust_decimal::Decimal;
use verdant_core::{CurrencyCode, Money, ProductId, ProductSnapshot};

use super::Engine;

#[derive(Subcommand)]
pub enum WishlistAction {
    /// Show the wishlist
    Show,
    /// Save a product
    Add {
        /// Product id
        #[arg(long)]
        product: String,
        /// Display title
        #[arg(long)]
        title: String,
        /// Price at save-time (e.g. 18.50)
        #[arg(long)]
        price: Decimal,
    },
    /// Remove a saved product
    Remove {
        /// Product id
        #[arg(long)]
        product: String,
    },
    /// Clear the wishlist
    Clear,
}

pub async fn run(
    engine: &Engine,
    action: WishlistAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        WishlistAction::Show => show(engine).await,
        WishlistAction::Add {
            product,
            title,
            price,
        } => {
            let snapshot = ProductSnapshot {
                product_id: ProductId::new(product),
                variant_id: None,
                title,
                unit_price: Money::new(price, CurrencyCode::USD),
            };
            let outcome = engine.wishlist.add(&snapshot).await;
            println!("{outcome}");
        }
        WishlistAction::Remove { product } => {
            let outcome = engine.wishlist.remove(&ProductId::new(product)).await;
            println!("{outcome}");
        }
        WishlistAction::Clear => {
            let outcome = engine.wishlist.clear().await;
            println!("{outcome}");
        }
    }
    Ok(())
}

async fn show(engine: &Engine) {
    let Some(wishlist) = engine.wishlist.snapshot().await else {
        println!("Wishlist is empty");
        return;
    };

    for entry in &wishlist.entries {
        println!("{}  {}  ({})", entry.title, entry.unit_price, entry.product_id);
    }
    println!(
        "{} item(s), {}  [{:?}]",
        wishlist.item_count(),
        engine.wishlist.subtotal(CurrencyCode::USD).await,
        engine.wishlist.sync_state().await
    );
}
