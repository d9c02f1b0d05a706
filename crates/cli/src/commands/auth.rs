//! Session commands.

use super::Engine;

/// Begin a login and print the authorization URL.
pub async fn login(engine: &Engine) -> Result<(), Box<dyn std::error::Error>> {
    let url = engine.auth.begin_login().await?;
    println!("Open this URL to sign in:");
    println!("{url}");
    println!();
    println!("Then run: verdant callback --code <code> --state <state>");
    Ok(())
}

/// Complete a login, then reconcile any locally accumulated state.
pub async fn callback(
    engine: &Engine,
    code: &str,
    state: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = engine.auth.complete_login(code, state).await?;
    println!("Signed in as {}", user.display_label());

    if let Err(e) = engine.cart.reconcile().await {
        println!("Cart sync failed: {e}");
    }
    if let Err(e) = engine.wishlist.reconcile().await {
        println!("Wishlist sync failed: {e}");
    }
    Ok(())
}

/// Show session and store status.
pub async fn status(engine: &Engine) {
    match engine.auth.current_user().await {
        Some(user) => println!("Signed in as {}", user.display_label()),
        None => println!("Not signed in"),
    }
    println!(
        "Cart: {} item(s) [{:?}]",
        engine.cart.item_count().await,
        engine.cart.sync_state().await
    );
    println!(
        "Wishlist: {} item(s) [{:?}]",
        engine.wishlist.item_count().await,
        engine.wishlist.sync_state().await
    );
}

/// End the session.
pub async fn logout(engine: &Engine) {
    engine.auth.logout().await;
    println!("Signed out");
}
