use anyhow::Result;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Api, Client, ResourceExt};
use scalingo_reconciler::k8s_client::{get_k8s_client, KubeResourceStore, KubeSecretStore};
use scalingo_reconciler::scalingo::ScalingoFactory;
use scalingo_reconciler::{Error, PostgreSQL, Reconciler, ReconcilerConfig, Requeue};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{self, AppState};
use crate::config::Config;

struct Context {
    reconciler: Reconciler,
    error_requeue_delay: Duration,
}

fn to_action(requeue: Requeue) -> Action {
    match requeue {
        Requeue::Now => Action::requeue(Duration::ZERO),
        Requeue::After(delay) => Action::requeue(delay),
        Requeue::Done => Action::await_change(),
    }
}

async fn reconcile(pg: Arc<PostgreSQL>, ctx: Arc<Context>) -> Result<Action, Error> {
    let namespace = pg.namespace().unwrap_or_default();
    let requeue = ctx.reconciler.reconcile(&namespace, &pg.name_any()).await?;
    Ok(to_action(requeue))
}

fn error_policy(pg: Arc<PostgreSQL>, error: &Error, ctx: Arc<Context>) -> Action {
    if error.is_conflict() {
        debug!(name = %pg.name_any(), "Resource changed underneath, retrying");
    } else {
        warn!(name = %pg.name_any(), namespace = ?pg.namespace(), %error, "Reconcile failed");
    }
    Action::requeue(ctx.error_requeue_delay)
}

fn apis(client: Client, namespace: Option<&str>) -> (Api<PostgreSQL>, Api<Secret>) {
    match namespace {
        Some(ns) => (Api::namespaced(client.clone(), ns), Api::namespaced(client, ns)),
        None => (Api::all(client.clone()), Api::all(client)),
    }
}

pub async fn run(health_port: Option<u16>) -> Result<()> {
    let config = Config::load()?;
    let port = health_port.unwrap_or(config.health_port);

    info!("Starting Scalingo operator");
    info!(
        port,
        namespace = config.watch_namespace.as_deref().unwrap_or("<all>"),
        requeue_delay = ?config.requeue_delay,
        "Configuration loaded"
    );

    let client = get_k8s_client().await?;
    let reconciler = Reconciler::new(
        Arc::new(KubeResourceStore::new(client.clone())),
        Arc::new(KubeSecretStore::new(client.clone())),
        Arc::new(ScalingoFactory::new(config.endpoints.clone())?),
        Arc::new(ReconcilerConfig {
            requeue_delay: config.requeue_delay,
        }),
    );
    let ctx = Arc::new(Context {
        reconciler,
        error_requeue_delay: config.error_requeue_delay,
    });

    let state = AppState::new();
    let server = tokio::spawn(api::start_server(port, state.clone()));

    let (resources, secrets) = apis(client, config.watch_namespace.as_deref());
    let controller = Controller::new(resources, watcher::Config::default())
        .owns(secrets, watcher::Config::default())
        .shutdown_on_signal();

    state.set_ready(true);
    info!("Watching PostgreSQL resources");

    controller
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((object, action)) => debug!(%object, ?action, "Reconciled"),
                Err(e) => debug!(error = %e, "Reconcile pass ended with error"),
            }
        })
        .await;

    info!("Shutting down");
    state.set_ready(false);
    server.abort();
    Ok(())
}
