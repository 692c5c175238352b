use crate::api_client::AdminApiClient;
use crate::auth::{require_role, Section, Session, SessionStore};
use crate::config::ConsoleConfig;
use crate::dates::{Clock, SystemClock};
use crate::domains::{Agents, Bets, Domain, Players, Users};
use crate::dto::*;
use crate::error::{ConsoleError, Result, ValidationError};
use crate::reconcile::FilterReconciler;
use crate::store::{DomainStore, FetchStatus, ResourceStore};
use std::sync::Arc;
use tracing::{info, warn};

/// One operator's console: API client, session and every store.
pub struct AdminConsole {
    api: AdminApiClient,
    session: SessionStore,
    clock: Arc<dyn Clock>,
    bets: Arc<DomainStore<Bets>>,
    agents: Arc<DomainStore<Agents>>,
    players: Arc<DomainStore<Players>>,
    users: Arc<DomainStore<Users>>,
    configs: ResourceStore<Vec<GameConfig>>,
    dashboard: ResourceStore<DashboardStats>,
    agent_directory: ResourceStore<Vec<Agent>>,
    selected_bet: ResourceStore<Bet>,
    selected_agent: ResourceStore<Agent>,
    selected_user: ResourceStore<User>,
}

impl AdminConsole {
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        let session = SessionStore::new();
        let api = AdminApiClient::new(config, Arc::new(session.clone()))?;
        Ok(Self::with_client(api, session))
    }

    /// Builds the console around an existing client. `session` must be the
    /// credential provider the client was built with.
    pub fn with_client(api: AdminApiClient, session: SessionStore) -> Self {
        let source = Arc::new(api.clone());
        Self {
            bets: Arc::new(DomainStore::new(source.clone())),
            agents: Arc::new(DomainStore::new(source.clone())),
            players: Arc::new(DomainStore::new(source.clone())),
            users: Arc::new(DomainStore::new(source)),
            configs: ResourceStore::new("game config"),
            dashboard: ResourceStore::new("dashboard"),
            agent_directory: ResourceStore::new("agent directory"),
            selected_bet: ResourceStore::new("selected bet"),
            selected_agent: ResourceStore::new("selected agent"),
            selected_user: ResourceStore::new("selected user"),
            api,
            session,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn api(&self) -> &AdminApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn current_admin(&self) -> Option<Admin> {
        self.session.admin()
    }

    // ========================================================================
    // Session
    // ========================================================================

    pub async fn login(&self, username: &str, password: &str) -> Result<Admin> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ValidationError::Form("username and password are required".into()).into());
        }
        let response = self.api.login(username.trim(), password).await?;
        let admin = response.admin.clone();
        self.session.set(Session {
            admin: response.admin,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        });
        Ok(admin)
    }

    /// Logs in with the credentials from the configuration file.
    pub async fn login_from_config(&self) -> Result<Admin> {
        let config = self.api.config();
        match (config.username.clone(), config.password.clone()) {
            (Some(username), Some(password)) => self.login(&username, &password).await,
            _ => Err(ValidationError::Form(
                "console.username and console.password must be configured".into(),
            )
            .into()),
        }
    }

    /// Ends the session locally even when the server call fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self.api.logout().await;
        if let Err(err) = &result {
            warn!("Server logout failed, clearing local session anyway: {}", err);
        }
        self.session.clear();
        self.selected_bet.clear();
        self.selected_agent.clear();
        self.selected_user.clear();
        info!("Logged out");
        result
    }

    pub async fn refresh_session(&self) -> Result<()> {
        let session = self.session.current().ok_or(ConsoleError::Unauthorized)?;
        let refreshed = self.api.refresh(&session.refresh_token).await?;
        self.session
            .update_tokens(refreshed.access_token, refreshed.refresh_token);
        Ok(())
    }

    /// Asks the server who the current token belongs to.
    pub async fn verify_session(&self) -> Result<Admin> {
        if !self.session.is_authenticated() {
            return Err(ConsoleError::Unauthorized);
        }
        self.api.me().await
    }

    pub fn authorize(&self, section: Section) -> Result<Session> {
        let session = self.session.current();
        require_role(session.as_ref(), section)?;
        session.ok_or(ConsoleError::Unauthorized)
    }

    // ========================================================================
    // List views
    // ========================================================================

    fn reconciler<D: Domain>(
        &self,
        store: &Arc<DomainStore<D>>,
        section: Section,
    ) -> Result<FilterReconciler<D>> {
        let session = self.authorize(section)?;
        Ok(FilterReconciler::new(store.clone(), self.clock.clone())
            .with_default_limit(self.api.config().default_limit)
            .with_agent_scope(session.agent_scope().map(str::to_string)))
    }

    pub fn bets_view(&self) -> Result<FilterReconciler<Bets>> {
        self.reconciler(&self.bets, Section::Bets)
    }

    pub fn agent_report_view(&self) -> Result<FilterReconciler<Agents>> {
        self.reconciler(&self.agents, Section::AgentReport)
    }

    pub fn player_summary_view(&self) -> Result<FilterReconciler<Players>> {
        self.reconciler(&self.players, Section::PlayerSummary)
    }

    pub fn users_view(&self) -> Result<FilterReconciler<Users>> {
        self.reconciler(&self.users, Section::Users)
    }

    pub fn bets(&self) -> &Arc<DomainStore<Bets>> {
        &self.bets
    }

    pub fn agents(&self) -> &Arc<DomainStore<Agents>> {
        &self.agents
    }

    pub fn players(&self) -> &Arc<DomainStore<Players>> {
        &self.players
    }

    pub fn users(&self) -> &Arc<DomainStore<Users>> {
        &self.users
    }

    /// Dropdown values for a list view.
    pub async fn filter_options<D: Domain>(&self) -> Result<FilterOptions> {
        self.api.filter_options(D::PATH).await
    }

    pub async fn active_games(&self) -> Result<Vec<Game>> {
        self.api.active_games().await
    }

    // ========================================================================
    // Dashboard
    // ========================================================================

    pub fn dashboard(&self) -> &ResourceStore<DashboardStats> {
        &self.dashboard
    }

    pub async fn load_dashboard(&self) -> Result<FetchStatus> {
        self.authorize(Section::Dashboard)?;
        Ok(self.dashboard.load(self.api.dashboard_stats()).await)
    }

    // ========================================================================
    // Selected entities
    // ========================================================================

    pub fn selected_bet(&self) -> &ResourceStore<Bet> {
        &self.selected_bet
    }

    pub fn selected_agent(&self) -> &ResourceStore<Agent> {
        &self.selected_agent
    }

    pub fn selected_user(&self) -> &ResourceStore<User> {
        &self.selected_user
    }

    pub async fn select_bet(&self, bet_id: &str) -> Result<FetchStatus> {
        self.authorize(Section::Bets)?;
        Ok(self.selected_bet.load(self.api.get_bet(bet_id)).await)
    }

    pub async fn select_agent(&self, agent_id: &str) -> Result<FetchStatus> {
        self.authorize(Section::AgentManagement)?;
        Ok(self.selected_agent.load(self.api.get_agent(agent_id)).await)
    }

    pub async fn select_user(&self, user_id: &str, agent_id: &str) -> Result<FetchStatus> {
        self.authorize(Section::Users)?;
        Ok(self
            .selected_user
            .load(self.api.get_user(user_id, agent_id))
            .await)
    }

    // ========================================================================
    // Agent management
    // ========================================================================

    pub fn agent_directory(&self) -> &ResourceStore<Vec<Agent>> {
        &self.agent_directory
    }

    pub async fn load_agent_directory(&self) -> Result<FetchStatus> {
        self.authorize(Section::AgentManagement)?;
        Ok(self.agent_directory.load(self.api.list_all_agents()).await)
    }

    pub async fn create_agent(&self, request: &CreateAgentRequest) -> Result<()> {
        self.authorize(Section::AgentManagement)?;
        request.clone().normalized().validate()?;
        self.agent_directory
            .mutate(self.api.create_agent(request), self.api.list_all_agents())
            .await
    }

    pub async fn update_agent(&self, agent_id: &str, request: &UpdateAgentRequest) -> Result<()> {
        self.authorize(Section::AgentManagement)?;
        self.agent_directory
            .mutate(
                self.api.update_agent(agent_id, request),
                self.api.list_all_agents(),
            )
            .await?;
        if self.selected_agent.value().is_some_and(|a| a.agent_id == agent_id) {
            self.selected_agent.load(self.api.get_agent(agent_id)).await;
        }
        Ok(())
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        self.authorize(Section::AgentManagement)?;
        self.agent_directory
            .mutate(self.api.delete_agent(agent_id), self.api.list_all_agents())
            .await?;
        if self.selected_agent.value().is_some_and(|a| a.agent_id == agent_id) {
            self.selected_agent.clear();
        }
        Ok(())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<()> {
        self.authorize(Section::Users)?;
        self.users.mutate(self.api.create_user(request)).await
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        agent_id: &str,
        request: &UpdateUserRequest,
    ) -> Result<()> {
        self.authorize(Section::Users)?;
        self.users
            .mutate(self.api.update_user(user_id, agent_id, request))
            .await
    }

    pub async fn delete_user(&self, user_id: &str, agent_id: &str) -> Result<()> {
        self.authorize(Section::Users)?;
        self.users
            .mutate(self.api.delete_user(user_id, agent_id))
            .await?;
        if self
            .selected_user
            .value()
            .is_some_and(|u| u.user_id == user_id && u.agent_id == agent_id)
        {
            self.selected_user.clear();
        }
        Ok(())
    }

    // ========================================================================
    // Game config
    // ========================================================================

    pub fn configs(&self) -> &ResourceStore<Vec<GameConfig>> {
        &self.configs
    }

    pub async fn load_configs(&self) -> Result<FetchStatus> {
        self.authorize(Section::Config)?;
        Ok(self.configs.load(self.api.list_configs()).await)
    }

    pub async fn create_config(&self, key: &str, value: &str) -> Result<()> {
        self.authorize(Section::Config)?;
        self.configs
            .mutate(self.api.create_config(key, value), self.api.list_configs())
            .await
    }

    pub async fn update_config(&self, key: &str, value: &str) -> Result<()> {
        self.authorize(Section::Config)?;
        self.configs
            .mutate(self.api.update_config(key, value), self.api.list_configs())
            .await
    }

    pub async fn delete_config(&self, key: &str) -> Result<()> {
        self.authorize(Section::Config)?;
        self.configs
            .mutate(self.api.delete_config(key), self.api.list_configs())
            .await
    }
}
