//! graph-gate - run one GraphQL operation with a cookie session

use clap::Parser;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use graph_gate::{AppContext, Args, FetchPolicy, GraphqlRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("graph_gate={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("Endpoint: {}", args.endpoint);
    info!("Session cookie: {}", args.session_cookie);
    info!(
        "Identity: pool={} client={} region={}",
        args.identity.user_pool_id.as_deref().unwrap_or("unset"),
        args.identity.user_pool_client_id.as_deref().unwrap_or("unset"),
        args.identity.region.as_deref().unwrap_or("unset"),
    );
    let disabled = args.disabled_typenames();
    if !disabled.is_empty() {
        info!("Normalization disabled for: {}", disabled.join(", "));
    }

    let ctx = AppContext::from_args(&args)?;

    let mut headers = HeaderMap::new();
    if let Some(ref raw) = args.cookie {
        headers.insert(COOKIE, HeaderValue::from_str(raw)?);
    }

    let token = args
        .token
        .clone()
        .or_else(|| ctx.tokens().from_request(&headers));

    match (&token, ctx.verifier()) {
        (None, _) => info!("No session token, running unauthenticated"),
        (Some(t), Some(verifier)) => {
            let result = verifier.verify_token(t);
            match result.claims {
                Some(claims) => info!("Session for {}", claims.sub),
                None => warn!(
                    "Session token failed verification: {}",
                    result.error.as_deref().unwrap_or("unknown")
                ),
            }
        }
        (Some(_), None) => info!("SESSION_SECRET unset, sending token unverified"),
    }

    let client = ctx.client(token).await?;

    let mut request = GraphqlRequest::new(args.query.clone());
    if let Some(ref vars) = args.variables {
        request = request.with_variables(serde_json::from_str(vars)?);
    }
    if let Some(ref name) = args.operation_name {
        request = request.with_operation_name(name.clone());
    }

    let data = if args.mutation {
        client.mutate(&request).await?
    } else {
        client.query(&request, FetchPolicy::CacheFirst).await?
    };

    println!("{}", serde_json::to_string_pretty(&data)?);
    info!(
        "Cache holds {} entities after the operation",
        client.cache().entity_count()
    );

    Ok(())
}
