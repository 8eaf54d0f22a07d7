//! Seed the catalog with demo items.
//!
//! Items are inserted without image files; their `filename` points at
//! `<id>.png` so dropping matching files into the upload directory makes
//! them show up.

use shopfront_core::{ImageExtension, Price};
use shopfront_storefront::db::ItemRepository;
use shopfront_storefront::models::ItemDraft;

use super::{CliError, connect};

const DEMO_ITEMS: &[(&str, &str, &str)] = &[
    ("Canvas Tote", "18.00", "Heavy cotton tote with an inside pocket."),
    ("Enamel Mug", "12.50", "Speckled enamel mug, 350 ml."),
    ("Wool Beanie", "24.00", "Ribbed merino beanie in charcoal."),
    ("Notebook", "9.75", "A5 dot-grid notebook, 120 pages."),
    ("Water Bottle", "21.00", "Insulated steel bottle, keeps cold for 24 hours."),
    ("Sticker Pack", "4.99", "Six vinyl stickers."),
];

/// Insert the demo items unless the catalog already has items.
///
/// # Returns
///
/// The number of items inserted.
///
/// # Errors
///
/// Returns an error if the database cannot be reached or an insert fails.
pub async fn items() -> Result<usize, CliError> {
    let pool = connect().await?;
    let mut conn = pool.acquire().await?;
    let mut repo = ItemRepository::new(&mut conn);

    if !repo.list_all().await?.is_empty() {
        tracing::warn!("Catalog already has items, skipping seed");
        return Ok(0);
    }

    for (title, price, description) in DEMO_ITEMS {
        let draft = ItemDraft {
            title: (*title).to_owned(),
            price: Price::parse(price).unwrap_or(Price::ZERO),
            description: (*description).to_owned(),
        };
        let id = repo.next_id().await?;
        let filename = ImageExtension::Png.file_name_for(id);
        repo.create(id, &draft, &filename).await?;
        tracing::info!(item_id = %id, title, "Seeded item");
    }

    tracing::info!(count = DEMO_ITEMS.len(), "Seeding complete");
    Ok(DEMO_ITEMS.len())
}
