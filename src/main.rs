//src/main.rs

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use printshop::{
    config::{AppState, Settings},
    docs::ApiDoc,
    handlers,
    middleware::auth::auth_guard,
};

#[tokio::main]
async fn main() {
    // Inicializa o logger (RUST_LOG, padrão "info").
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env().expect("Configuração inválida.");

    let app_state = AppState::new(&settings)
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Pedidos: checkout, orçamento, consulta e esteira
    let order_routes = Router::new()
        .route("/", post(handlers::orders::create_order))
        .route("/quote", post(handlers::orders::quote_order))
        .route("/{order_id}", get(handlers::orders::get_order))
        .route("/{order_id}/status", patch(handlers::orders::update_status))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Materiais: cadastro, movimentações e livro-razão
    let material_routes = Router::new()
        .route("/", post(handlers::inventory::create_material))
        .route("/{material_id}/restock", post(handlers::inventory::restock_material))
        .route("/{material_id}/adjust", post(handlers::inventory::adjust_material))
        .route("/{material_id}/movements", get(handlers::inventory::list_movements))
        .route("/{material_id}/ledger-check", get(handlers::inventory::ledger_check))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let customer_routes = Router::new()
        .route("/lookup", get(handlers::crm::lookup_customer))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let frontend_origin: HeaderValue = settings
        .frontend_origin
        .parse()
        .expect("FRONTEND_ORIGIN inválido.");

    let cors = CorsLayer::new()
        .allow_origin(frontend_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT_LANGUAGE]);

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/orders", order_routes)
        .nest("/api/materials", material_routes)
        .nest("/api/customers", customer_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", settings.bind_addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
