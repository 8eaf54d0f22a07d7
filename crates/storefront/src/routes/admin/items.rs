//! Catalog management: list, create (with image upload), edit and delete.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{ImageExtension, ItemId, Price};

use crate::db::{DbConn, ItemRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{
    FlashLevel, FlashMessage, Flashes, NEW_ITEM_PATH, RequireAdmin, flash_redirect,
    too_large_message,
};
use crate::models::ItemDraft;
use crate::routes::home::{ItemView, parse_item_path};
use crate::state::AppState;

const ITEMS_PATH: &str = "/admin/items";
const BAD_PRICE: &str = "Price must be a real number.";
const MISSING_FIELDS: &str = "Missing title, price or description.";

// =============================================================================
// Templates
// =============================================================================

/// Item list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/items.html")]
pub struct ItemsTemplate {
    pub flashes: Vec<FlashMessage>,
    pub admin: String,
    pub items: Vec<ItemView>,
}

/// New item form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/new_item.html")]
pub struct NewItemTemplate {
    pub flashes: Vec<FlashMessage>,
    pub admin: String,
    /// e.g. "File too large. Max size is 4 MB."
    pub size_hint: String,
}

/// Edit item form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/edit_item.html")]
pub struct EditItemTemplate {
    pub flashes: Vec<FlashMessage>,
    pub admin: String,
    pub item: ItemView,
}

// =============================================================================
// Form Types
// =============================================================================

/// Edit item form data.
#[derive(Debug, Deserialize)]
pub struct EditItemForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub description: String,
}

/// Delete item form data.
#[derive(Debug, Deserialize)]
pub struct DeleteItemForm {
    #[serde(default)]
    pub id: String,
}

/// Image part of the new-item form.
struct UploadedFile {
    name: String,
    bytes: Bytes,
}

/// All parts of the new-item form, before validation.
#[derive(Default)]
struct NewItemUpload {
    title: Option<String>,
    price: Option<String>,
    description: Option<String>,
    file: Option<UploadedFile>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(e.body_text())
    }
}

impl NewItemUpload {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut upload = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("title") => upload.title = Some(field.text().await.map_err(multipart_error)?),
                Some("price") => upload.price = Some(field.text().await.map_err(multipart_error)?),
                Some("description") => {
                    upload.description = Some(field.text().await.map_err(multipart_error)?);
                }
                Some("file") => {
                    let name = field.file_name().unwrap_or_default().to_owned();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    upload.file = Some(UploadedFile { name, bytes });
                }
                _ => {}
            }
        }

        Ok(upload)
    }
}

/// Build a draft from raw form values, or the flash text explaining why not.
fn draft_from(title: &str, price: &str, description: &str) -> std::result::Result<ItemDraft, &'static str> {
    let price = Price::parse(price).map_err(|_| BAD_PRICE)?;

    let title = title.trim();
    let description = description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(MISSING_FIELDS);
    }

    Ok(ItemDraft {
        title: title.to_owned(),
        price,
        description: description.to_owned(),
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// List every item.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    Flashes(flashes): Flashes,
    mut conn: DbConn,
) -> Result<ItemsTemplate> {
    let items = ItemRepository::new(&mut conn).list_all().await?;

    Ok(ItemsTemplate {
        flashes,
        admin: admin.username.into_inner(),
        items: items.iter().map(ItemView::from).collect(),
    })
}

/// Display the new item form.
pub async fn new_item_page(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Flashes(flashes): Flashes,
) -> NewItemTemplate {
    NewItemTemplate {
        flashes,
        admin: admin.username.into_inner(),
        size_hint: too_large_message(state.config().max_upload_bytes),
    }
}

/// Create an item from the multipart form and store its image.
///
/// The image is written as `<id>.<ext>` before the row is inserted with
/// that same ID.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    mut conn: DbConn,
    multipart: Multipart,
) -> Result<Response> {
    let upload = NewItemUpload::read(multipart).await?;

    let draft = match draft_from(
        upload.title.as_deref().unwrap_or_default(),
        upload.price.as_deref().unwrap_or_default(),
        upload.description.as_deref().unwrap_or_default(),
    ) {
        Ok(draft) => draft,
        Err(message) => {
            return flash_redirect(&session, FlashLevel::Error, message, NEW_ITEM_PATH).await;
        }
    };

    let Some(file) = upload.file else {
        return flash_redirect(&session, FlashLevel::Error, "No file part.", NEW_ITEM_PATH).await;
    };
    if file.name.is_empty() {
        return flash_redirect(&session, FlashLevel::Error, "No selected file.", NEW_ITEM_PATH)
            .await;
    }
    let Ok(extension) = ImageExtension::from_filename(&file.name) else {
        return flash_redirect(&session, FlashLevel::Error, "File type not allowed.", NEW_ITEM_PATH)
            .await;
    };
    if file.bytes.len() > state.config().max_upload_bytes {
        return Err(AppError::PayloadTooLarge);
    }

    let mut items = ItemRepository::new(&mut conn);
    let id = items.next_id().await?;
    let file_name = extension.file_name_for(id);

    state.images().save(&file_name, &file.bytes).await?;

    if let Err(e) = items.create(id, &draft, &file_name).await {
        if let Err(cleanup) = state.images().remove(&file_name).await {
            tracing::warn!(error = %cleanup, file = %file_name, "Failed to remove orphaned image");
        }
        return Err(e.into());
    }
    tracing::info!(item_id = %id, file = %file_name, bytes = file.bytes.len(), "Item created");

    flash_redirect(
        &session,
        FlashLevel::Info,
        format!("Successfully added a new item of id: {id}"),
        ITEMS_PATH,
    )
    .await
}

/// Display the edit form for one item.
#[instrument(skip_all, fields(admin_id = %admin.id, item_id = %id))]
pub async fn edit_page(
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Flashes(flashes): Flashes,
    mut conn: DbConn,
) -> Result<EditItemTemplate> {
    let item_id = parse_item_path(&id)?;
    let item = ItemRepository::new(&mut conn)
        .get(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("item {item_id}")))?;

    Ok(EditItemTemplate {
        flashes,
        admin: admin.username.into_inner(),
        item: ItemView::from(&item),
    })
}

/// Save title, price and description of an item.
#[instrument(skip_all, fields(admin_id = %admin.id, item_id = %id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    session: Session,
    mut conn: DbConn,
    Form(form): Form<EditItemForm>,
) -> Result<Response> {
    let item_id = parse_item_path(&id)?;
    let back = format!("/admin/edit-item/{item_id}");

    let draft = match draft_from(&form.title, &form.price, &form.description) {
        Ok(draft) => draft,
        Err(message) => return flash_redirect(&session, FlashLevel::Error, message, &back).await,
    };

    match ItemRepository::new(&mut conn).update(item_id, &draft).await {
        Ok(()) => {}
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound(format!("item {item_id}")));
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!("Item updated");

    flash_redirect(
        &session,
        FlashLevel::Info,
        format!("Successfully updated an item of id: {item_id}"),
        ITEMS_PATH,
    )
    .await
}

/// Delete an item and its image, unless orders still reference it.
#[instrument(skip_all, fields(admin_id = %admin.id, item_id = %form.id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    mut conn: DbConn,
    Form(form): Form<DeleteItemForm>,
) -> Result<Response> {
    let Ok(item_id) = form.id.trim().parse::<ItemId>() else {
        return flash_redirect(&session, FlashLevel::Error, "Invalid item.", ITEMS_PATH).await;
    };

    let mut items = ItemRepository::new(&mut conn);
    let Some(item) = items.get(item_id).await? else {
        return flash_redirect(&session, FlashLevel::Error, "Item not found.", ITEMS_PATH).await;
    };

    if items.order_count(item_id).await? > 0 {
        return flash_redirect(
            &session,
            FlashLevel::Error,
            format!("Item {item_id} has orders and can't be deleted."),
            ITEMS_PATH,
        )
        .await;
    }

    items.delete(item_id).await?;

    if !item.filename.is_empty() {
        match state.images().remove(&item.filename).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(file = %item.filename, "Image already missing"),
            Err(e) => tracing::warn!(error = %e, file = %item.filename, "Failed to remove image"),
        }
    }
    tracing::info!("Item deleted");

    flash_redirect(
        &session,
        FlashLevel::Info,
        format!("Successfully deleted an item of id: {item_id}"),
        ITEMS_PATH,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_from_checks_price_first() {
        assert_eq!(draft_from("", "abc", ""), Err(BAD_PRICE));
        assert_eq!(draft_from("Mug", "", "Blue"), Err(BAD_PRICE));
        assert_eq!(draft_from("Mug", "-1", "Blue"), Err(BAD_PRICE));
    }

    #[test]
    fn test_draft_from_requires_title_and_description() {
        assert_eq!(draft_from(" ", "3", "Blue"), Err(MISSING_FIELDS));
        assert_eq!(draft_from("Mug", "3", ""), Err(MISSING_FIELDS));
    }

    #[test]
    fn test_draft_from_trims_fields() {
        let draft = draft_from(" Mug ", "3.50", " Blue ").ok();
        assert_eq!(
            draft,
            Some(ItemDraft {
                title: "Mug".to_owned(),
                price: Price::parse("3.50").unwrap_or(Price::ZERO),
                description: "Blue".to_owned(),
            })
        );
    }
}
