use chrono::{DateTime, Utc};
use domain_categories::Category;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidateLength, ValidateUrl, ValidationError};

/// Most photos accepted by a single create/add/update request.
pub const MAX_PHOTOS_PER_REQUEST: usize = 10;

const MAX_PHOTO_URL_LEN: u64 = 2048;

/// Every URL must be absolute and at most 2048 characters.
fn validate_photo_urls(urls: &[String]) -> Result<(), ValidationError> {
    for (index, url) in urls.iter().enumerate() {
        if !url.validate_url() || !url.validate_length(None, Some(MAX_PHOTO_URL_LEN), None) {
            let mut err = ValidationError::new("url");
            err.message = Some(Cow::Borrowed("photo must be a valid URL of at most 2048 characters"));
            err.add_param(Cow::Borrowed("index"), &index);
            return Err(err);
        }
    }
    Ok(())
}

/// Each tag 1..=50 characters.
fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    for (index, tag) in tags.iter().enumerate() {
        if !tag.validate_length(Some(1), Some(50), None) {
            let mut err = ValidationError::new("tag_length");
            err.add_param(Cow::Borrowed("index"), &index);
            return Err(err);
        }
    }
    Ok(())
}

/// Distinguishes an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A listing available for rental
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Item {
    pub id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 10, max = 2000))]
    pub description: String,
    /// Price per rental in minor currency units
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(length(min = 1, max = 500))]
    pub location: String,
    /// Always equal to "this item has at least one photo"
    pub has_photos: bool,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    #[validate(length(max = 20), custom(function = "validate_tags"))]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemPhoto {
    pub id: Uuid,
    pub item_id: Uuid,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Item together with its photos (oldest first) and category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemDetails {
    #[serde(flatten)]
    pub item: Item,
    pub photos: Vec<ItemPhoto>,
    pub category: Option<Category>,
}

/// List entry: the item with its category, without photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemSummary {
    #[serde(flatten)]
    pub item: Item,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateItem {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 10, max = 2000))]
    pub description: String,
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(length(min = 1, max = 500))]
    pub location: String,
    pub author_id: Uuid,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(max = 20), custom(function = "validate_tags"))]
    pub tags: Vec<String>,
    /// Photo URLs stored with the item; empty means no photos
    #[serde(default)]
    #[validate(length(max = 10), custom(function = "validate_photo_urls"))]
    pub photos: Vec<String>,
}

/// Partial update. Absent fields are left unchanged; `category_id: null`
/// detaches the item from its category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateItem {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    #[validate(length(min = 1, max = 500))]
    pub location: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
    #[validate(length(max = 20), custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    #[validate(length(max = 10), custom(function = "validate_photo_urls"))]
    pub photos_to_add: Vec<String>,
    #[serde(default)]
    pub photo_ids_to_delete: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddPhotos {
    #[validate(length(max = 10), custom(function = "validate_photo_urls"))]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeletePhotos {
    pub photo_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PhotoCount {
    pub item_id: Uuid,
    pub count: u64,
    pub has_photos: bool,
}

/// Listing filters. Every field is optional; bounds are inclusive and text
/// matches are case-insensitive substrings.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, IntoParams, ToSchema,
)]
#[into_params(parameter_in = Query)]
pub struct ItemFilter {
    #[validate(range(min = 0))]
    pub min_price: Option<i64>,
    #[validate(range(min = 0))]
    pub max_price: Option<i64>,
    /// Substring of the location
    pub location: Option<String>,
    /// Substring of the title or description
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    /// Page size (default 20, max 100)
    pub limit: Option<i64>,
    /// Rows to skip (default 0)
    pub offset: Option<i64>,
}

impl Item {
    pub fn new(input: &CreateItem) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: input.title.clone(),
            description: input.description.clone(),
            price: input.price,
            location: input.location.clone(),
            has_photos: !input.photos.is_empty(),
            author_id: input.author_id,
            category_id: input.category_id,
            tags: input.tags.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the field part of a patch; photo changes are applied by the
    /// repository. The result must be re-validated by the caller.
    pub fn apply_update(&mut self, update: &UpdateItem) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(location) = &update.location {
            self.location = location.clone();
        }
        if let Some(category_id) = update.category_id {
            self.category_id = category_id;
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
        self.updated_at = Utc::now();
    }
}

impl ItemPhoto {
    pub fn new(item_id: Uuid, url: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            item_id,
            url,
            created_at: now,
            updated_at: now,
        }
    }
}

impl UpdateItem {
    pub fn touches_photos(&self) -> bool {
        !self.photos_to_add.is_empty() || !self.photo_ids_to_delete.is_empty()
    }
}

impl ItemFilter {
    /// In-memory evaluation of the same predicates the SQL filter builds.
    pub fn matches(&self, item: &Item) -> bool {
        use database::matches_ci;

        self.min_price.is_none_or(|min| item.price >= min)
            && self.max_price.is_none_or(|max| item.price <= max)
            && self
                .location
                .as_deref()
                .is_none_or(|needle| matches_ci(&item.location, needle))
            && self.search.as_deref().is_none_or(|needle| {
                matches_ci(&item.title, needle) || matches_ci(&item.description, needle)
            })
            && self
                .category_id
                .is_none_or(|id| item.category_id == Some(id))
            && self.author_id.is_none_or(|id| item.author_id == id)
    }
}
