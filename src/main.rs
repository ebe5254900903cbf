use std::{path::Path, process, sync::Arc};

use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use vastra::{
    application::{
        admin::{
            categories::{AdminCategoryService, CreateCategoryCommand, UpdateCategoryCommand},
            images::{AdminImageService, ImageBuckets, ImageStore, ImageTarget, ImageUpload},
            parse_sizes,
            products::{
                AdminProductService, CreateProductCommand, ProductInput, UpdateProductCommand,
            },
            session::AdminSessionService,
            settings::{AdminSettingsService, UpdateSettingsCommand},
        },
        catalog::CatalogService,
        enquiry::EnquiryService,
        error::AppError,
        favorites::FavoritesStore,
        listing::FacetSelection,
        repos::{CategoriesRepo, CategoriesWriteRepo, ProductsRepo, ProductsWriteRepo, SettingsRepo},
        storefront::StorefrontService,
    },
    cache::CacheConfig,
    config::{self, AdminCommand, Command, FavoritesCommand, SortArg},
    domain::types::{SortMode, parse_stock},
    infra::{
        auth::RestAuthProvider,
        backend::BackendClient,
        db::PostgresRepositories,
        error::InfraError,
        local_store,
        storage::RestImageStore,
        telemetry,
        uploads::LocalImageStore,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
    } else {
        let subscriber = tracing_fmt()
            .with_max_level(Level::ERROR)
            .with_writer(std::io::stderr)
            .finish();
        let dispatch = Dispatch::new(subscriber);
        dispatcher::with_default(&dispatch, || {
            error!(error = %error, "application error");
        });
    }
    eprintln!("{}", error.presentation_message());
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        Command::Migrations(_) => run_migrations(&settings).await,
        Command::Favorites(args) => run_favorites(&settings, args.command).await,
        Command::Admin(args) => run_admin(&settings, args).await,
        command => run_storefront(&settings, command).await,
    }
}

async fn run_migrations(settings: &config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(settings).await?;
    repositories
        .health_check()
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!(target = "vastra::migrations", "Migrations applied");
    Ok(())
}

async fn run_storefront(settings: &config::Settings, command: Command) -> Result<(), AppError> {
    let repositories = init_repositories(settings).await?;
    let storefront = build_storefront(repositories, settings);

    match command {
        Command::Home => print_json(&storefront.home_page().await),
        Command::Categories => print_json(&storefront.catalog().list_categories().await?),
        Command::Products(args) => {
            let selection = FacetSelection {
                fabrics: args.fabrics,
                colors: args.colors,
            };
            let page = storefront
                .category_page(args.category.as_deref(), sort_mode(args.sort), &selection)
                .await?;
            print_json(&page)
        }
        Command::Product(args) => match storefront.product_page(&args.slug).await? {
            Some(page) => print_json(&page),
            None => Err(AppError::not_found("product", args.slug)),
        },
        Command::Search(args) => print_json(&storefront.search_page(&args.query).await?),
        Command::Enquire(args) => {
            let link = storefront
                .enquire(&args.slug, args.size.as_deref(), &args.page_url)
                .await?;
            println!("{link}");
            Ok(())
        }
        Command::Favorites(_) | Command::Admin(_) | Command::Migrations(_) => Err(
            AppError::unexpected("command is not a storefront read"),
        ),
    }
}

async fn run_favorites(
    settings: &config::Settings,
    command: FavoritesCommand,
) -> Result<(), AppError> {
    match command {
        FavoritesCommand::Toggle { id } => {
            let favorites = open_favorites(settings);
            let favorite = favorites.toggle(&id);
            print_json(&json!({
                "id": id,
                "favorite": favorite,
                "count": favorites.count(),
            }))
        }
        FavoritesCommand::Clear => {
            let favorites = open_favorites(settings);
            favorites.clear();
            print_json(&json!({ "count": favorites.count() }))
        }
        FavoritesCommand::List => {
            let repositories = init_repositories(settings).await?;
            let storefront = build_storefront(repositories, settings);
            print_json(&storefront.favorites_page().await?)
        }
    }
}

async fn run_admin(settings: &config::Settings, args: config::AdminArgs) -> Result<(), AppError> {
    let backend = backend_client(settings)?
        .ok_or_else(|| InfraError::configuration("backend.base_url is required for admin commands"))?;
    let session = AdminSessionService::new(Arc::new(RestAuthProvider::new(backend.clone())));

    let email = args
        .credentials
        .email
        .ok_or_else(|| AppError::validation("--email or VASTRA_ADMIN_EMAIL is required"))?;
    let password = args
        .credentials
        .password
        .ok_or_else(|| AppError::validation("--password or VASTRA_ADMIN_PASSWORD is required"))?;

    if matches!(args.command, AdminCommand::SignUp) {
        let signed_up = session.sign_up(&email, &password).await?;
        info!(
            target = "vastra::admin",
            user_id = %signed_up.user_id,
            "Administrator account registered"
        );
        return print_json(&json!({ "user_id": signed_up.user_id, "email": signed_up.email }));
    }

    session.sign_in(&email, &password).await?;
    let result = run_admin_command(settings, &backend, &session, args.command).await;

    if let Err(err) = session.sign_out().await {
        warn!(
            target = "vastra::admin",
            error = %err,
            result = "ignored",
            "failed to sign out"
        );
    }
    result
}

async fn run_admin_command(
    settings: &config::Settings,
    backend: &BackendClient,
    session: &AdminSessionService,
    command: AdminCommand,
) -> Result<(), AppError> {
    session.require_session()?;

    let repositories = init_repositories(settings).await?;
    let catalog = build_catalog(&repositories, settings);
    let categories_repo: Arc<dyn CategoriesRepo> = repositories.clone();
    let categories_write_repo: Arc<dyn CategoriesWriteRepo> = repositories.clone();
    let products_repo: Arc<dyn ProductsRepo> = repositories.clone();
    let products_write_repo: Arc<dyn ProductsWriteRepo> = repositories.clone();
    let settings_repo: Arc<dyn SettingsRepo> = repositories.clone();

    let images = AdminImageService::new(
        image_store(settings, backend)?,
        ImageBuckets {
            products: settings.uploads.product_bucket.clone(),
            categories: settings.uploads.category_bucket.clone(),
        },
        settings.uploads.max_bytes,
    );
    let admin_categories = AdminCategoryService::new(
        categories_repo.clone(),
        categories_write_repo,
        catalog.clone(),
    );
    let admin_products = AdminProductService::new(
        products_repo,
        products_write_repo,
        categories_repo,
        catalog.clone(),
    );
    let admin_settings = AdminSettingsService::new(settings_repo, catalog);

    match command {
        AdminCommand::SignUp => Ok(()),
        AdminCommand::CreateCategory(fields) => {
            let image = upload_optional(&images, ImageTarget::Category, fields.image.as_deref())
                .await?;
            let category = admin_categories
                .create_category(CreateCategoryCommand {
                    name: fields.name,
                    slug: fields.slug,
                    description: fields.description,
                    image,
                })
                .await?;
            print_json(&category)
        }
        AdminCommand::UpdateCategory { id, fields } => {
            let image = upload_optional(&images, ImageTarget::Category, fields.image.as_deref())
                .await?;
            let category = admin_categories
                .update_category(UpdateCategoryCommand {
                    id,
                    name: fields.name,
                    slug: fields.slug,
                    description: fields.description,
                    image,
                })
                .await?;
            print_json(&category)
        }
        AdminCommand::DeleteCategory { id } => {
            admin_categories.delete_category(id).await?;
            print_json(&json!({ "deleted": id }))
        }
        AdminCommand::CreateProduct(fields) => {
            let input = product_input(&images, fields).await?;
            let product = admin_products
                .create_product(CreateProductCommand { input })
                .await?;
            print_json(&product)
        }
        AdminCommand::UpdateProduct { id, fields } => {
            let input = product_input(&images, fields).await?;
            let product = admin_products
                .update_product(UpdateProductCommand { id, input })
                .await?;
            print_json(&product)
        }
        AdminCommand::DeleteProduct { id } => {
            admin_products.delete_product(id).await?;
            print_json(&json!({ "deleted": id }))
        }
        AdminCommand::UpdateSettings(fields) => {
            let updated = admin_settings
                .update(UpdateSettingsCommand {
                    id: None,
                    whatsapp_number: fields.whatsapp_number,
                    hero_title: fields.hero_title,
                    hero_subtitle: fields.hero_subtitle,
                    announcement_text: fields.announcement_text,
                })
                .await?;
            print_json(&updated)
        }
    }
}

async fn product_input(
    images: &AdminImageService,
    fields: config::ProductFieldsArgs,
) -> Result<ProductInput, AppError> {
    let mut uploads = Vec::with_capacity(fields.images.len());
    for path in &fields.images {
        uploads.push(read_upload(path).await?);
    }
    let image_urls = images.upload_all(ImageTarget::Product, uploads).await?;

    Ok(ProductInput {
        name: fields.name,
        slug: fields.slug,
        price: fields.price,
        discount_price: fields.discount_price,
        description: fields.description,
        stock: parse_stock(&fields.stock)?,
        fabric: fields.fabric,
        color: fields.color,
        style: fields.style,
        sizes: parse_sizes(&fields.sizes),
        images: image_urls,
        is_new: fields.is_new,
        is_sale: fields.is_sale,
        category_id: fields.category,
    })
}

async fn upload_optional(
    images: &AdminImageService,
    target: ImageTarget,
    path: Option<&Path>,
) -> Result<Option<String>, AppError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let upload = read_upload(path).await?;
    Ok(Some(images.upload(target, upload).await?))
}

async fn read_upload(path: &Path) -> Result<ImageUpload, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(InfraError::from)?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();

    Ok(ImageUpload {
        filename,
        content_type: None,
        bytes: Bytes::from(bytes),
    })
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(
        database_url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_catalog(
    repositories: &Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> CatalogService {
    let categories_repo: Arc<dyn CategoriesRepo> = repositories.clone();
    let products_repo: Arc<dyn ProductsRepo> = repositories.clone();
    let settings_repo: Arc<dyn SettingsRepo> = repositories.clone();

    CatalogService::new(
        categories_repo,
        products_repo,
        settings_repo,
        &CacheConfig::from(&settings.cache),
    )
}

fn build_storefront(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> StorefrontService {
    StorefrontService::new(
        build_catalog(&repositories, settings),
        open_favorites(settings),
        EnquiryService::new(settings.storefront.default_whatsapp_number.clone()),
    )
}

fn open_favorites(settings: &config::Settings) -> Arc<FavoritesStore> {
    let storage = local_store::open_or_memory(&settings.favorites.storage_path);
    Arc::new(FavoritesStore::initialize(storage))
}

fn backend_client(settings: &config::Settings) -> Result<Option<BackendClient>, AppError> {
    let Some(base_url) = settings.backend.base_url.as_ref() else {
        return Ok(None);
    };

    BackendClient::new(
        base_url.as_str(),
        settings.backend.anon_key.clone(),
        settings.backend.request_timeout,
    )
    .map(Some)
    .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))
}

fn image_store(
    settings: &config::Settings,
    backend: &BackendClient,
) -> Result<Arc<dyn ImageStore>, AppError> {
    match settings.uploads.directory.as_ref() {
        Some(directory) => {
            let store = LocalImageStore::new(directory.clone(), settings.uploads.public_base.clone())
                .map_err(InfraError::from)?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(RestImageStore::new(backend.clone()))),
    }
}

fn sort_mode(sort: SortArg) -> SortMode {
    match sort {
        SortArg::Newest => SortMode::Newest,
        SortArg::PriceAsc => SortMode::PriceAsc,
        SortArg::PriceDesc => SortMode::PriceDesc,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{out}");
    Ok(())
}
