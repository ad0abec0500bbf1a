//! Product catalog service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Product service for catalog management
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// A persisted product
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub brand: Option<String>,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub avg_cost: Decimal,
    pub min_stock: Decimal,
    pub is_active: bool,
    pub has_variants: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted product variant
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductVariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub avg_cost: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub brand: Option<String>,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub min_stock: Option<Decimal>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub barcode: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub buy_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub min_stock: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Input for creating a product variant
#[derive(Debug, Deserialize)]
pub struct CreateVariantInput {
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}

fn validate_prices(buy_price: Decimal, sell_price: Decimal) -> AppResult<()> {
    if buy_price < Decimal::ZERO || sell_price < Decimal::ZERO {
        return Err(AppError::validation(
            "buy_price/sell_price",
            "Prices cannot be negative",
            "Harga tidak boleh negatif",
        ));
    }
    Ok(())
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product
    pub async fn create_product(
        &self,
        branch_id: Uuid,
        input: CreateProductInput,
    ) -> AppResult<ProductRow> {
        if input.sku.trim().is_empty() || input.name.trim().is_empty() {
            return Err(AppError::validation(
                "sku/name",
                "SKU and name are required",
                "SKU dan nama wajib diisi",
            ));
        }
        validate_prices(input.buy_price, input.sell_price)?;
        let min_stock = input.min_stock.unwrap_or(Decimal::ZERO);
        if min_stock < Decimal::ZERO {
            return Err(AppError::validation(
                "min_stock",
                "Minimum stock cannot be negative",
                "Stok minimum tidak boleh negatif",
            ));
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM products WHERE branch_id = $1 AND sku = $2)",
        )
        .bind(branch_id)
        .bind(&input.sku)
        .fetch_one(&self.db)
        .await?;
        if exists {
            return Err(AppError::DuplicateEntry("SKU".to_string()));
        }

        let product = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (
                branch_id, sku, barcode, name, description, category, brand,
                buy_price, sell_price, avg_cost, min_stock
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $8, $10)
            RETURNING id, branch_id, sku, barcode, name, description, category, brand,
                      buy_price, sell_price, avg_cost, min_stock, is_active, has_variants,
                      created_at, updated_at
            "#,
        )
        .bind(branch_id)
        .bind(&input.sku)
        .bind(&input.barcode)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.category)
        .bind(&input.brand)
        .bind(input.buy_price)
        .bind(input.sell_price)
        .bind(min_stock)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Update a product
    pub async fn update_product(
        &self,
        branch_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<ProductRow> {
        let existing = self.get_product(branch_id, product_id).await?;

        let buy_price = input.buy_price.unwrap_or(existing.buy_price);
        let sell_price = input.sell_price.unwrap_or(existing.sell_price);
        validate_prices(buy_price, sell_price)?;

        let product = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET barcode = COALESCE($1, barcode),
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                brand = COALESCE($5, brand),
                buy_price = $6,
                sell_price = $7,
                min_stock = COALESCE($8, min_stock),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $10
            RETURNING id, branch_id, sku, barcode, name, description, category, brand,
                      buy_price, sell_price, avg_cost, min_stock, is_active, has_variants,
                      created_at, updated_at
            "#,
        )
        .bind(&input.barcode)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.category)
        .bind(&input.brand)
        .bind(buy_price)
        .bind(sell_price)
        .bind(input.min_stock)
        .bind(input.is_active)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Get a product by id
    pub async fn get_product(&self, branch_id: Uuid, product_id: Uuid) -> AppResult<ProductRow> {
        sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, branch_id, sku, barcode, name, description, category, brand,
                   buy_price, sell_price, avg_cost, min_stock, is_active, has_variants,
                   created_at, updated_at
            FROM products
            WHERE id = $1 AND branch_id = $2
            "#,
        )
        .bind(product_id)
        .bind(branch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// List active products, optionally filtered by a name/SKU/barcode search
    pub async fn list_products(
        &self,
        branch_id: Uuid,
        search: Option<&str>,
    ) -> AppResult<Vec<ProductRow>> {
        let pattern = search.map(|s| format!("%{}%", s));

        let products = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, branch_id, sku, barcode, name, description, category, brand,
                   buy_price, sell_price, avg_cost, min_stock, is_active, has_variants,
                   created_at, updated_at
            FROM products
            WHERE branch_id = $1 AND is_active = true
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR sku ILIKE $2 OR barcode ILIKE $2)
            ORDER BY name
            "#,
        )
        .bind(branch_id)
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Add a variant to a product
    pub async fn create_variant(
        &self,
        branch_id: Uuid,
        product_id: Uuid,
        input: CreateVariantInput,
    ) -> AppResult<ProductVariantRow> {
        validate_prices(input.buy_price, input.sell_price)?;

        // Parent must exist within the branch
        self.get_product(branch_id, product_id).await?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM product_variants WHERE product_id = $1 AND sku = $2)",
        )
        .bind(product_id)
        .bind(&input.sku)
        .fetch_one(&self.db)
        .await?;
        if exists {
            return Err(AppError::DuplicateEntry("variant SKU".to_string()));
        }

        let variant = sqlx::query_as::<_, ProductVariantRow>(
            r#"
            INSERT INTO product_variants (product_id, sku, barcode, name, buy_price, sell_price, avg_cost)
            VALUES ($1, $2, $3, $4, $5, $6, $5)
            RETURNING id, product_id, sku, barcode, name, buy_price, sell_price, avg_cost,
                      is_active, created_at
            "#,
        )
        .bind(product_id)
        .bind(&input.sku)
        .bind(&input.barcode)
        .bind(&input.name)
        .bind(input.buy_price)
        .bind(input.sell_price)
        .fetch_one(&self.db)
        .await?;

        sqlx::query("UPDATE products SET has_variants = true, updated_at = NOW() WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        Ok(variant)
    }

    /// List variants of a product
    pub async fn list_variants(
        &self,
        branch_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Vec<ProductVariantRow>> {
        self.get_product(branch_id, product_id).await?;

        let variants = sqlx::query_as::<_, ProductVariantRow>(
            r#"
            SELECT id, product_id, sku, barcode, name, buy_price, sell_price, avg_cost,
                   is_active, created_at
            FROM product_variants
            WHERE product_id = $1
            ORDER BY name
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(variants)
    }
}
