use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Command-line arguments for the Vastra binary.
#[derive(Debug, Parser)]
#[command(name = "vastra", version, about = "Vastra ethnic-wear storefront")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VASTRA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the hosted backend base URL.
    #[arg(long = "backend-url", value_name = "URL", global = true)]
    pub backend_url: Option<String>,

    /// Override the file that stores favorites between runs.
    #[arg(
        long = "favorites-path",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub favorites_path: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Show the landing page: announcement, categories and featured products.
    Home,
    /// List all categories.
    Categories,
    /// List products, optionally within one category.
    Products(ProductsArgs),
    /// Show one product with related products.
    Product(ProductArgs),
    /// Search products by name.
    Search(SearchArgs),
    /// Manage the local favorites list.
    Favorites(FavoritesArgs),
    /// Build a WhatsApp enquiry link for a product.
    Enquire(EnquireArgs),
    /// Catalog administration.
    Admin(AdminArgs),
    /// Database migration utilities.
    Migrations(MigrationsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Newest,
    PriceAsc,
    PriceDesc,
}

#[derive(Debug, Args, Clone)]
pub struct ProductsArgs {
    /// Category slug; all products when omitted.
    #[arg(long, value_name = "SLUG")]
    pub category: Option<String>,

    #[arg(long, value_enum, default_value_t = SortArg::Newest)]
    pub sort: SortArg,

    /// Keep products made of this fabric (repeatable).
    #[arg(long = "fabric", value_name = "FABRIC")]
    pub fabrics: Vec<String>,

    /// Keep products in this color (repeatable).
    #[arg(long = "color", value_name = "COLOR")]
    pub colors: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ProductArgs {
    #[arg(value_name = "SLUG")]
    pub slug: String,
}

#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    #[arg(value_name = "QUERY")]
    pub query: String,
}

#[derive(Debug, Args, Clone)]
pub struct FavoritesArgs {
    #[command(subcommand)]
    pub command: FavoritesCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum FavoritesCommand {
    /// Show favorited products.
    List,
    /// Add or remove a product id.
    Toggle {
        #[arg(value_name = "PRODUCT_ID")]
        id: String,
    },
    /// Remove every favorite.
    Clear,
}

#[derive(Debug, Args, Clone)]
pub struct EnquireArgs {
    #[arg(value_name = "SLUG")]
    pub slug: String,

    /// Selected size; required when the product offers sizes.
    #[arg(long)]
    pub size: Option<String>,

    /// Product page link included in the message.
    #[arg(long = "page-url", value_name = "URL")]
    pub page_url: String,
}

#[derive(Debug, Args, Clone)]
pub struct AdminArgs {
    #[command(flatten)]
    pub credentials: AdminCredentials,

    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Debug, Args, Clone, Default)]
pub struct AdminCredentials {
    #[arg(long, env = "VASTRA_ADMIN_EMAIL", value_name = "EMAIL")]
    pub email: Option<String>,

    #[arg(
        long,
        env = "VASTRA_ADMIN_PASSWORD",
        value_name = "PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum AdminCommand {
    /// Register an administrator account and request the admin role.
    SignUp,
    /// Create a category.
    CreateCategory(CategoryFieldsArgs),
    /// Update a category.
    UpdateCategory {
        #[arg(long, value_name = "UUID")]
        id: Uuid,
        #[command(flatten)]
        fields: CategoryFieldsArgs,
    },
    /// Delete a category; its products become uncategorized.
    DeleteCategory {
        #[arg(value_name = "UUID")]
        id: Uuid,
    },
    /// Create a product.
    CreateProduct(ProductFieldsArgs),
    /// Update a product.
    UpdateProduct {
        #[arg(long, value_name = "UUID")]
        id: Uuid,
        #[command(flatten)]
        fields: ProductFieldsArgs,
    },
    /// Delete a product.
    DeleteProduct {
        #[arg(value_name = "UUID")]
        id: Uuid,
    },
    /// Update storefront settings.
    UpdateSettings(SettingsFieldsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct CategoryFieldsArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Image file to upload for the category.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ProductFieldsArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub price: Decimal,

    #[arg(long = "discount-price")]
    pub discount_price: Option<Decimal>,

    #[arg(long)]
    pub description: Option<String>,

    /// Units in stock; blank means zero.
    #[arg(long, default_value = "")]
    pub stock: String,

    #[arg(long)]
    pub fabric: Option<String>,

    #[arg(long)]
    pub color: Option<String>,

    #[arg(long)]
    pub style: Option<String>,

    /// Comma-separated sizes, e.g. "S, M, L".
    #[arg(long, default_value = "")]
    pub sizes: String,

    /// Image files to upload, primary first (repeatable).
    #[arg(long = "image", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub images: Vec<PathBuf>,

    /// Category id the product belongs to.
    #[arg(long, value_name = "UUID")]
    pub category: Option<Uuid>,

    #[arg(long = "new", action = clap::ArgAction::SetTrue)]
    pub is_new: bool,

    #[arg(long = "sale", action = clap::ArgAction::SetTrue)]
    pub is_sale: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SettingsFieldsArgs {
    #[arg(long = "whatsapp-number")]
    pub whatsapp_number: Option<String>,

    #[arg(long = "hero-title")]
    pub hero_title: Option<String>,

    #[arg(long = "hero-subtitle")]
    pub hero_subtitle: Option<String>,

    #[arg(long = "announcement")]
    pub announcement_text: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct MigrationsArgs {
    #[command(subcommand)]
    pub command: MigrationsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum MigrationsCommand {
    /// Apply pending migrations to the configured database.
    Run,
}
