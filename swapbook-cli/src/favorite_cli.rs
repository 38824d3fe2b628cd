//! Favorite management commands
//!
//! These work on the favorites file alone and never fetch the catalog.

use anyhow::Result;
use clap::Subcommand;

use swapbook_core::{FavoriteKey, SwapbookConfig};

use crate::browse_cli::open_favorites;

#[derive(Subcommand, Debug)]
pub enum FavoriteCommand {
    /// Add a car to favorites, or remove it if already there
    Toggle {
        /// Brand name, as shown in the catalog
        brand: String,
        /// Car name, as shown in the catalog
        car: String,
    },

    /// List favorite keys
    List {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Check whether a car is a favorite
    Check { brand: String, car: String },
}

impl FavoriteCommand {
    pub async fn execute(self, config: &SwapbookConfig) -> Result<()> {
        let store = open_favorites(config)?;

        match self {
            FavoriteCommand::Toggle { brand, car } => {
                if FavoriteKey::is_ambiguous(&brand, &car) {
                    tracing::warn!("'{brand}' / '{car}' contains '|'; the key may collide");
                }
                let now_favorite = store.toggle(FavoriteKey::new(&brand, &car)).await?;
                println!("{}", toggle_message(&brand, &car, now_favorite));
            }
            FavoriteCommand::List { json } => {
                let snapshot = store.current();
                if json {
                    let keys: Vec<&str> = snapshot.iter().map(FavoriteKey::as_str).collect();
                    println!("{}", serde_json::to_string_pretty(&keys)?);
                } else if snapshot.is_empty() {
                    println!("No favorites yet.");
                } else {
                    for key in snapshot.iter() {
                        match key.split() {
                            Some((brand, car)) => println!("  {brand} {car}"),
                            None => println!("  {key}"),
                        }
                    }
                }
            }
            FavoriteCommand::Check { brand, car } => {
                let favorite = store.contains(&FavoriteKey::new(&brand, &car));
                println!("{}", if favorite { "yes" } else { "no" });
            }
        }

        Ok(())
    }
}

fn toggle_message(brand: &str, car: &str, now_favorite: bool) -> String {
    if now_favorite {
        format!("Added {brand} {car} to favorites")
    } else {
        format!("Removed {brand} {car} from favorites")
    }
}
