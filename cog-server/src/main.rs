use clap::Parser;
use cog_eloqua::client::api::EloquaConfig;
use cog_eloqua::client::RestClientFactory;
use cog_eloqua::registry::StepRegistry;
use cog_eloqua::service::Cog;
use cog_proto::cog_service_server::CogServiceServer;
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[derive(Parser, Debug)]
struct Args {
    #[clap(long, env = "COG_BIND", default_value = "[::]:28866")]
    bind: SocketAddr,
    #[clap(long, env = "ELOQUA_BASE_URL", default_value = "https://secure.p01.eloqua.com")]
    eloqua_url: Url,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "h2=warn,info");
    }

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    debug!("Config: {:#?}", args);

    let registry = Arc::new(StepRegistry::all_steps());
    let factory = Arc::new(RestClientFactory::new(EloquaConfig {
        base_url: args.eloqua_url,
    }));
    let cog = Cog::new(registry, factory);

    info!("Starting Eloqua Cog gRPC server on {}", args.bind);
    Server::builder()
        .add_service(CogServiceServer::new(cog))
        .serve(args.bind)
        .await
        .expect("gRPC server failed");
}
