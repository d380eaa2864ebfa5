//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::application::services::{
    AccountContext, AdminService, AdminServiceImpl, AuditService, AuditServiceImpl, AuthService,
    AuthServiceImpl, ContactService, ContactServiceImpl, DemoService, DemoServiceImpl,
    EmailTokenServiceImpl, JobService, JobServiceImpl, NoteService, NoteServiceImpl, RoleService,
    RoleServiceImpl, TokenService, UserService, UserServiceImpl,
};
use crate::config::Settings;
use crate::domain::{EmailTokenRepository, RefreshTokenRepository, UserRepository};
use crate::infrastructure::cache::{self, Cache};
use crate::infrastructure::captcha::{CaptchaService, TurnstileCaptchaService};
use crate::infrastructure::database;
use crate::infrastructure::email::{create_email_service, EmailService};
use crate::infrastructure::jobs::{
    ExpiredEmailTokenCleanupJob, ExpiredRefreshTokenCleanupJob, JobScheduler,
};
use crate::infrastructure::repositories::{
    PgAuditEventRepository, PgContactRepository, PgEmailTokenRepository, PgNoteRepository,
    PgRefreshTokenRepository, PgRoleRepository, PgUserRepository,
};
use crate::presentation::http::{handlers, routes};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: Arc<dyn Cache>,
    pub settings: Arc<Settings>,
    pub tokens: TokenService,
    pub scheduler: Arc<JobScheduler>,
    /// Security stamp lookups on cache misses
    pub users: Arc<dyn UserRepository>,

    pub auth: Arc<dyn AuthService>,
    pub profile: Arc<dyn UserService>,
    pub contacts: Arc<dyn ContactService>,
    pub notes: Arc<dyn NoteService>,
    pub admin: Arc<dyn AdminService>,
    pub roles: Arc<dyn RoleService>,
    pub jobs: Arc<dyn JobService>,
    pub demo: Arc<dyn DemoService>,
}

impl AppState {
    /// Wire repositories and services over the given backends.
    pub fn new(
        db: PgPool,
        cache: Arc<dyn Cache>,
        settings: Settings,
        mailer: Arc<dyn EmailService>,
        captcha: Arc<dyn CaptchaService>,
        scheduler: Arc<JobScheduler>,
    ) -> Self {
        let settings = Arc::new(settings);

        let user_repo = Arc::new(PgUserRepository::new(db.clone()));
        let role_repo = Arc::new(PgRoleRepository::new(db.clone()));
        let refresh_repo = Arc::new(PgRefreshTokenRepository::new(db.clone()));
        let email_token_repo = Arc::new(PgEmailTokenRepository::new(db.clone()));
        let audit_repo = Arc::new(PgAuditEventRepository::new(db.clone()));
        let contact_repo = Arc::new(PgContactRepository::new(db.clone()));
        let note_repo = Arc::new(PgNoteRepository::new(db.clone()));

        let audit: Arc<dyn AuditService> = Arc::new(AuditServiceImpl::new(audit_repo));
        let ctx = AccountContext {
            audit: audit.clone(),
            email_tokens: Arc::new(EmailTokenServiceImpl::new(
                email_token_repo,
                settings.auth.email_token.clone(),
            )),
            mailer,
            cache: cache.clone(),
            settings: settings.clone(),
        };

        Self {
            db,
            cache,
            tokens: TokenService::new(settings.auth.jwt.clone()),
            scheduler: scheduler.clone(),
            users: user_repo.clone(),
            auth: Arc::new(AuthServiceImpl::new(
                user_repo.clone(),
                role_repo.clone(),
                refresh_repo.clone(),
                captcha,
                ctx.clone(),
            )),
            profile: Arc::new(UserServiceImpl::new(
                user_repo.clone(),
                role_repo.clone(),
                ctx.clone(),
            )),
            contacts: Arc::new(ContactServiceImpl::new(contact_repo, audit)),
            notes: Arc::new(NoteServiceImpl::new(note_repo)),
            admin: Arc::new(AdminServiceImpl::new(
                user_repo.clone(),
                role_repo.clone(),
                refresh_repo,
                ctx.clone(),
            )),
            roles: Arc::new(RoleServiceImpl::new(
                role_repo.clone(),
                user_repo.clone(),
                ctx.clone(),
            )),
            jobs: Arc::new(JobServiceImpl::new(scheduler)),
            demo: Arc::new(DemoServiceImpl::new(user_repo, role_repo, ctx)),
            settings,
        }
    }
}

/// Register the built-in maintenance jobs.
pub fn register_jobs(scheduler: &JobScheduler, db: &PgPool) -> Result<()> {
    let email_tokens: Arc<dyn EmailTokenRepository> =
        Arc::new(PgEmailTokenRepository::new(db.clone()));
    let refresh_tokens: Arc<dyn RefreshTokenRepository> =
        Arc::new(PgRefreshTokenRepository::new(db.clone()));

    scheduler.register(Arc::new(ExpiredEmailTokenCleanupJob::new(email_tokens)))?;
    scheduler.register(Arc::new(ExpiredRefreshTokenCleanupJob::new(refresh_tokens)))?;
    Ok(())
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    scheduler: Arc<JobScheduler>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        handlers::health::init_server_start();

        let db = database::create_pool(&settings.database).await?;
        info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db).await?;
        }

        let cache: Arc<dyn Cache> = Arc::new(cache::create_redis_cache(&settings.redis).await?);
        let mailer = create_email_service(&settings.email)?;
        let captcha: Arc<dyn CaptchaService> =
            Arc::new(TurnstileCaptchaService::new(&settings.captcha)?);

        let scheduler = Arc::new(JobScheduler::new(settings.jobs.history_size));
        if settings.jobs.enabled {
            register_jobs(&scheduler, &db)?;
            scheduler.start();
        } else {
            warn!("Recurring jobs are disabled");
        }

        if settings.demo.enabled && settings.is_production() {
            warn!("Demo mode is enabled in production");
        }

        let addr = settings.server_addr();
        let listener = TcpListener::bind(&addr).await?;
        info!(addr = %addr, "Listener bound");

        let state = AppState::new(db, cache, settings, mailer, captcha, scheduler.clone());
        let router = routes::create_router(state);

        Ok(Self {
            listener,
            router,
            scheduler,
        })
    }

    /// Get the local address the server is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        self.scheduler.shutdown();
        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
