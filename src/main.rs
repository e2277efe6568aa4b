use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volatile_host::config::HostConfig;
use volatile_host::document::FrontendDocuments;
use volatile_host::effects::ChildProcessHost;
use volatile_host::host::HostContext;
use volatile_host::runtime::HostRuntime;
use volatile_host::server::{AppState, build_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "volatile_host=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = HostConfig::from_env();

    let documents = match (&config.document_path, &config.inspector_document_path) {
        (Some(plain), Some(inspector)) => FrontendDocuments::from_files(plain, inspector)
            .expect("configured front-end document files must be readable"),
        _ => {
            tracing::warn!("No front-end document configured, serving built-in placeholders");
            FrontendDocuments::built_in()
        }
    };

    let worker_host = ChildProcessHost::new(&config.worker_command, config.worker_args.clone());
    let context = HostContext::new(documents, config.worker_program.clone());

    let (runtime, runtime_tx) = HostRuntime::new(context, worker_host);
    let shutdown = CancellationToken::new();
    let runtime_handle = tokio::spawn(runtime.run(shutdown.clone()));

    let app = build_router(AppState::new(runtime_tx));

    tracing::info!("listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move {
                tokio::signal::ctrl_c().await.ok();
                shutdown.cancel();
            }
        })
        .await
        .unwrap();

    shutdown.cancel();
    runtime_handle.await.ok();
}
