//! Level-triggered reconciliation of PostgreSQL resources
//!
//! Each call to [`Reconciler::reconcile`] reads the resource, advances it by
//! at most one durable step and tells the caller when to come back:
//!
//! 1. add the finalizer, then requeue
//! 2. initialise the status conditions, then requeue
//! 3. initialise the running annotation, then requeue
//! 4. create the remote database and wait for it
//! 5. once running, mark it available and write the connection secret
//! 6. afterwards, converge features, firewall rules and plan
//!
//! Deletion is handled first, before any of the above. Nothing is persisted
//! when a step fails, so the next pass retries it from the last stored state.

use kube::{Resource, ResourceExt};
use scalingo_models::{compose_connection_url_name, DatabaseType, Secret};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::crd::PostgreSQL;
use crate::error::{Result, WrapErr};
use crate::manager::{Manager, UpdateOutcome};
use crate::provider::ProviderFactory;
use crate::secrets;
use crate::status;
use crate::store::{ResourceStore, SecretStore};

/// Delay before looking again at a database that is still converging
pub const DEFAULT_REQUEUE_DELAY: Duration = Duration::from_secs(30);

/// Read-only settings shared by every reconcile pass
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub requeue_delay: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            requeue_delay: DEFAULT_REQUEUE_DELAY,
        }
    }
}

/// What the scheduler should do after a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    /// Run again right away, the resource just moved one step
    Now,
    /// Run again later, the remote side is still converging
    After(Duration),
    /// Nothing left to do until the resource changes
    Done,
}

pub struct Reconciler {
    resources: Arc<dyn ResourceStore>,
    secrets: Arc<dyn SecretStore>,
    providers: Arc<dyn ProviderFactory>,
    config: Arc<ReconcilerConfig>,
}

impl Reconciler {
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        secrets: Arc<dyn SecretStore>,
        providers: Arc<dyn ProviderFactory>,
        config: Arc<ReconcilerConfig>,
    ) -> Self {
        Self {
            resources,
            secrets,
            providers,
            config,
        }
    }

    #[instrument(skip(self))]
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<Requeue> {
        let Some(mut pg) = self.resources.get(namespace, name).await.wrap("get resource")? else {
            debug!("Resource is gone");
            return Ok(Requeue::Done);
        };

        if status::is_deletion_requested(&pg) {
            return self.finalize(pg).await.wrap("finalize");
        }

        if status::add_finalizer(&mut pg) {
            info!("Adding finalizer");
            self.resources.update(&pg).await.wrap("add finalizer")?;
            return Ok(Requeue::Now);
        }

        if !status::is_status_initialized(&pg) {
            info!("Initialising status");
            status::set_initial_status(&mut pg);
            self.resources.update_status(&pg).await.wrap("init status")?;
            return Ok(Requeue::Now);
        }

        if status::running_flag(&pg).is_none() {
            status::set_running_flag(&mut pg, false);
            self.resources.update(&pg).await.wrap("init running annotation")?;
            return Ok(Requeue::Now);
        }

        let db_id = status::remote_database_id(&pg).to_string();
        let running = status::is_database_running(&pg);

        if db_id.is_empty() && !running {
            return self.create(pg).await.wrap("create database");
        }

        if !status::is_database_available(&pg) || !running {
            return self.wait_until_running(pg, &db_id).await.wrap("wait for database");
        }

        self.update(pg, &db_id).await.wrap("update database")
    }

    async fn manager_for(&self, pg: &PostgreSQL) -> Result<Manager> {
        let namespace = pg.namespace().unwrap_or_default();
        let auth = &pg.spec.auth_secret;
        let token = secrets::get_secret(self.secrets.as_ref(), &namespace, &auth.name, &auth.key)
            .await
            .wrap("get auth secret")?;

        let client = self
            .providers
            .connect(&token, &pg.spec.region)
            .await
            .wrap("create database manager")?;
        Ok(Manager::new(DatabaseType::PostgreSql, client))
    }

    async fn finalize(&self, mut pg: PostgreSQL) -> Result<Requeue> {
        if !status::has_finalizer(&pg) {
            return Ok(Requeue::Done);
        }

        let db_id = status::remote_database_id(&pg).to_string();
        if db_id.is_empty() {
            debug!("No remote database was created");
        } else {
            let manager = self.manager_for(&pg).await?;
            match manager.delete_database(&db_id).await {
                Ok(()) => info!(db_id, "Remote database deleted"),
                Err(e) if e.is_not_found() => warn!(db_id, "Remote database already gone"),
                Err(e) => return Err(e),
            }
        }

        status::remove_finalizer(&mut pg);
        self.resources.update(&pg).await.wrap("remove finalizer")?;
        Ok(Requeue::Done)
    }

    async fn create(&self, mut pg: PostgreSQL) -> Result<Requeue> {
        let desired = pg.spec.to_database().wrap("translate database spec")?;
        let manager = self.manager_for(&pg).await?;

        let created = manager.create_database(&desired).await?;
        if created.id.is_empty() {
            return Err(crate::error::Error::Empty("created database id"));
        }

        status::set_remote_database_id(&mut pg, &created.id);
        status::set_provisioning(&mut pg);
        self.resources.update_status(&pg).await.wrap("update status")?;

        info!(db_id = %created.id, "Database created, waiting for provisioning");
        Ok(Requeue::After(self.config.requeue_delay))
    }

    async fn wait_until_running(&self, mut pg: PostgreSQL, db_id: &str) -> Result<Requeue> {
        let manager = self.manager_for(&pg).await?;
        let db = manager.get_database(db_id).await?;
        if !db.is_running() {
            debug!(db_id, status = %db.status, "Database not running yet");
            return Ok(Requeue::After(self.config.requeue_delay));
        }

        if status::set_provisioned(&mut pg) {
            pg = self.resources.update_status(&pg).await.wrap("update status")?;
        }

        let url = manager.get_database_url(&db).await?;
        let target = &pg.spec.conn_info_secret_target;
        let secret = Secret {
            namespace: pg.namespace().unwrap_or_default(),
            name: target.name.clone(),
            key: compose_connection_url_name(target.prefix.as_deref().unwrap_or_default(), &url.name),
            value: url.value,
        };
        secrets::set_secret(self.secrets.as_ref(), &secret, pg.controller_owner_ref(&()))
            .await
            .wrap("write connection secret")?;
        info!(secret = %secret, "Connection secret written");

        status::set_running_flag(&mut pg, true);
        self.resources.update(&pg).await.wrap("set running annotation")?;
        Ok(Requeue::Done)
    }

    async fn update(&self, mut pg: PostgreSQL, db_id: &str) -> Result<Requeue> {
        let desired = pg.spec.to_database().wrap("translate database spec")?;
        let manager = self.manager_for(&pg).await?;

        // a plan change is in flight, wait for it before touching anything else
        if status::is_database_provisioning(&pg) {
            let db = manager.get_database(db_id).await?;
            if !db.is_running() {
                debug!(db_id, status = %db.status, "Plan change in progress");
                return Ok(Requeue::After(self.config.requeue_delay));
            }
            status::set_provisioned(&mut pg);
            self.resources.update_status(&pg).await.wrap("update status")?;
            info!(db_id, "Plan change done");
            return Ok(Requeue::Now);
        }

        match manager.update_database(db_id, &desired).await? {
            UpdateOutcome::Provisioning => {
                status::set_provisioning(&mut pg);
                self.resources.update_status(&pg).await.wrap("update status")?;
                Ok(Requeue::After(self.config.requeue_delay))
            }
            outcome => {
                if outcome == UpdateOutcome::Updated {
                    info!(db_id, "Database updated");
                }
                if status::set_provisioned(&mut pg) {
                    self.resources.update_status(&pg).await.wrap("update status")?;
                }
                Ok(Requeue::Done)
            }
        }
    }
}
