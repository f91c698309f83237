use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{QueryBuilder, SupabaseClient};
use shared_models::error::AppError;
use shared_utils::validation::slugify;

use crate::models::{CatalogRead, Category, CreateCategoryRequest, UpdateCategoryRequest};
use crate::services::mock;

const CATEGORIES: &str = "categories";

pub struct CategoryService {
    supabase: SupabaseClient,
}

impl CategoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_categories(&self) -> Result<CatalogRead<Vec<Category>>, AppError> {
        let query = QueryBuilder::new()
            .order("sortOrder", true)
            .order("name", true)
            .build();

        match self.supabase.select::<Category>(CATEGORIES, &query).await {
            Ok(categories) => Ok(CatalogRead::live(categories)),
            Err(e) if e.is_unavailable() => {
                warn!("Category store unavailable, serving sample data: {}", e);
                Ok(CatalogRead::fallback(mock::mock_categories()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_category(&self, id: &str) -> Result<CatalogRead<Category>, AppError> {
        let query = QueryBuilder::new().eq("id", id).build();

        match self.supabase.select_one::<Category>(CATEGORIES, &query).await {
            Ok(Some(category)) => Ok(CatalogRead::live(category)),
            Ok(None) => Err(category_not_found()),
            Err(e) if e.is_unavailable() => {
                warn!("Category store unavailable, serving sample data: {}", e);
                mock::mock_category(id)
                    .map(CatalogRead::fallback)
                    .ok_or_else(category_not_found)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_category(&self, request: CreateCategoryRequest) -> Result<Category, AppError> {
        let name = request.name.map(|n| n.trim().to_string()).unwrap_or_default();
        if name.is_empty() {
            return Err(AppError::ValidationError("Category name is required".to_string()));
        }

        let slug = slugify(request.slug.as_deref().unwrap_or(&name));
        if slug.is_empty() {
            return Err(AppError::ValidationError("Category slug cannot be empty".to_string()));
        }

        self.ensure_unique(&name, &slug, None).await?;

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name,
            description: request.description,
            parent: request.parent.filter(|p| !p.is_empty()),
            image: request.image,
            icon: request.icon,
            slug,
            sort_order: request.sort_order.unwrap_or(0),
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created: Category = self.supabase.insert(CATEGORIES, &category).await?;
        info!("Created category {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_category(&self, id: &str, request: UpdateCategoryRequest) -> Result<Category, AppError> {
        let existing = self.find(id).await?.ok_or_else(category_not_found)?;

        let name = match request.name.map(|n| n.trim().to_string()) {
            Some(n) if n.is_empty() => {
                return Err(AppError::ValidationError("Category name cannot be empty".to_string()))
            }
            Some(n) => n,
            None => existing.name.clone(),
        };
        let slug = match request.slug.as_deref() {
            Some(s) => slugify(s),
            None => existing.slug.clone(),
        };
        if slug.is_empty() {
            return Err(AppError::ValidationError("Category slug cannot be empty".to_string()));
        }
        if request.parent.as_deref() == Some(id) {
            return Err(AppError::ValidationError("A category cannot be its own parent".to_string()));
        }

        self.ensure_unique(&name, &slug, Some(id)).await?;

        let mut changes = serde_json::Map::new();
        changes.insert("name".into(), json!(name));
        changes.insert("slug".into(), json!(slug));
        if let Some(description) = request.description {
            changes.insert("description".into(), json!(description));
        }
        if let Some(parent) = request.parent {
            changes.insert("parent".into(), json!(Some(parent).filter(|p| !p.is_empty())));
        }
        if let Some(image) = request.image {
            changes.insert("image".into(), json!(image));
        }
        if let Some(icon) = request.icon {
            changes.insert("icon".into(), json!(icon));
        }
        if let Some(sort_order) = request.sort_order {
            changes.insert("sortOrder".into(), json!(sort_order));
        }
        if let Some(is_active) = request.is_active {
            changes.insert("isActive".into(), json!(is_active));
        }
        changes.insert("updatedAt".into(), json!(Utc::now()));

        let query = QueryBuilder::new().eq("id", id).build();
        let updated: Vec<Category> = self.supabase.update(CATEGORIES, &query, &changes).await?;
        updated.into_iter().next().ok_or_else(category_not_found)
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), AppError> {
        self.find(id).await?.ok_or_else(category_not_found)?;

        let query = QueryBuilder::new().eq("id", id).build();
        self.supabase.delete(CATEGORIES, &query).await?;

        info!("Deleted category {}", id);
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<Category>, AppError> {
        let query = QueryBuilder::new().eq("id", id).build();
        Ok(self.supabase.select_one(CATEGORIES, &query).await?)
    }

    async fn ensure_unique(&self, name: &str, slug: &str, exclude_id: Option<&str>) -> Result<(), AppError> {
        let by_name = QueryBuilder::new().eq("name", name).build();
        let by_slug = QueryBuilder::new().eq("slug", slug).build();

        let name_taken: Vec<Category> = self.supabase.select(CATEGORIES, &by_name).await?;
        if name_taken.iter().any(|c| Some(c.id.as_str()) != exclude_id) {
            return Err(AppError::Conflict(format!("Category name '{}' already exists", name)));
        }

        let slug_taken: Vec<Category> = self.supabase.select(CATEGORIES, &by_slug).await?;
        if slug_taken.iter().any(|c| Some(c.id.as_str()) != exclude_id) {
            return Err(AppError::Conflict(format!("Category slug '{}' already exists", slug)));
        }

        Ok(())
    }
}

fn category_not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}
