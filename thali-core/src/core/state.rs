use chrono_tz::Tz;
use shared::error::{AppError, AppResult};
use shared::models::SystemType;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::analytics::{CounterAnalytics, HotelAnalytics, KitchenAnalytics};
use crate::auth::{AccountService, AuthProvider, LocalAuthProvider};
use crate::core::{BackgroundTasks, Config, SessionContext};
use crate::counter::{CleanupOutcome, CounterCatalog, CounterOrders, DailyCleanup, RunningCoupons};
use crate::coupon::CouponAllocator;
use crate::kitchen::{KitchenBoard, active_snapshot, ready_snapshot};
use crate::printing::PrintChannel;
use crate::settings::SettingsService;
use crate::store::{DocumentStore, MemoryStore, RedbStore, Snapshot, Subscription};
use crate::table::{Billing, MenuService, RunningTables};
use crate::utils::time::today;
use crate::view::{ArrivalNotifier, HighlightSet, SnapshotTracker, run_view};

/// 未读取的到达提示上限，超出后丢弃新提示
const ARRIVAL_QUEUE_CAPACITY: usize = 64;

/// 核心状态 - 持有所有服务的共享引用
///
/// 所有服务内部都是 `Arc`，克隆成本极低。
///
/// # 服务组件
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | store | 租户文档存储 |
/// | accounts | 注册 / 登录 / 管理员解锁 |
/// | settings | 用户设置、酒店信息、常用商品 |
/// | coupons | 取号分配器 |
/// | catalog / counter_orders / running_coupons / cleanup | 柜台流程 |
/// | menu / tables / billing / kitchen | 堂食流程 |
/// | counter_analytics / hotel_analytics / kitchen_analytics | 报表 |
///
/// ```ignore
/// let state = CoreState::open(Config::from_env())?;
/// let session = state.accounts.sign_in("owner@hotel.in", "secret1").await?;
/// let views = state.start_session(&session).await?;
/// ```
#[derive(Clone)]
pub struct CoreState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub accounts: Arc<AccountService>,
    pub settings: SettingsService,
    pub coupons: CouponAllocator,
    pub catalog: CounterCatalog,
    pub counter_orders: CounterOrders,
    pub running_coupons: RunningCoupons,
    pub cleanup: DailyCleanup,
    pub menu: MenuService,
    pub tables: RunningTables,
    pub billing: Billing,
    pub kitchen: KitchenBoard,
    pub counter_analytics: CounterAnalytics,
    pub hotel_analytics: HotelAnalytics,
    pub kitchen_analytics: KitchenAnalytics,
}

impl CoreState {
    /// 打开本地 redb 数据库并组装服务
    pub fn open(config: Config) -> AppResult<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            AppError::internal(format!("Failed to create data dir {}: {}", config.data_dir, e))
        })?;
        let path = config.database_path();
        let store = RedbStore::open(&path)?;
        tracing::info!(path = %path.display(), "Document store opened");
        Ok(Self::builder(config, Arc::new(store)).build())
    }

    /// 内存存储，测试和临时会话使用
    pub fn in_memory(config: Config) -> Self {
        Self::builder(config, Arc::new(MemoryStore::new())).build()
    }

    pub fn builder(config: Config, store: Arc<dyn DocumentStore>) -> CoreStateBuilder {
        CoreStateBuilder {
            config,
            store,
            auth: None,
            printer: None,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.config.timezone
    }

    /// 会话启动：柜台租户先做每日清理，再启动对应的实时视图
    pub async fn start_session(&self, session: &SessionContext) -> AppResult<SessionViews> {
        let scope = session.scope()?.clone();
        let system_type = session.system_type();
        let mut tasks = BackgroundTasks::new();

        let mut cleanup = None;
        if system_type == Some(SystemType::Counter) {
            // 清理失败不阻止登录，下次登录会重试
            match self.cleanup.run(&scope, today(self.timezone())).await {
                Ok(outcome) => cleanup = Some(outcome),
                Err(e) => tracing::error!(tenant = %scope, error = %e, "Daily cleanup failed"),
            }
        }

        let (highlights, arrivals) = match system_type {
            Some(SystemType::Table) => {
                let highlights = Arc::new(HighlightSet::new(self.config.kot_highlight()));
                spawn_view(
                    &mut tasks,
                    "kitchen_board",
                    self.kitchen.subscribe(scope.clone()),
                    highlights.clone(),
                    active_snapshot,
                );
                // 取餐视图：新做好的单提示桌号
                let (notifier, arrivals) = ArrivalNotifier::new("table", ARRIVAL_QUEUE_CAPACITY);
                spawn_view(
                    &mut tasks,
                    "pickup_view",
                    self.kitchen.subscribe(scope.clone()),
                    Arc::new(notifier),
                    ready_snapshot,
                );
                (highlights, arrivals)
            }
            _ => {
                let highlights =
                    Arc::new(HighlightSet::new(self.config.counter_highlight()).skip_first_load());
                spawn_view(
                    &mut tasks,
                    "counter_display",
                    self.running_coupons.subscribe_table_display(scope.clone()),
                    highlights.clone(),
                    std::convert::identity,
                );
                let (notifier, arrivals) = ArrivalNotifier::new("couponId", ARRIVAL_QUEUE_CAPACITY);
                spawn_view(
                    &mut tasks,
                    "running_coupons",
                    self.running_coupons.subscribe(scope.clone()),
                    Arc::new(notifier),
                    std::convert::identity,
                );
                (highlights, arrivals)
            }
        };

        tracing::info!(tenant = %scope, views = tasks.len(), "Session started");
        Ok(SessionViews {
            tasks,
            cleanup,
            highlights,
            arrivals,
        })
    }
}

fn spawn_view<O, F>(
    tasks: &mut BackgroundTasks,
    name: &'static str,
    subscription: Subscription,
    observer: Arc<O>,
    shape: F,
) where
    O: crate::view::DiffObserver + 'static,
    F: Fn(Snapshot) -> Snapshot + Send + 'static,
{
    let tracker = SnapshotTracker::new();
    tracker.observe(observer);
    let cancel = tasks.shutdown_token();
    tasks.spawn(name, run_view(subscription, tracker, cancel, shape));
}

/// Assembles [`CoreState`] with optional auth provider and printer
pub struct CoreStateBuilder {
    config: Config,
    store: Arc<dyn DocumentStore>,
    auth: Option<Arc<dyn AuthProvider>>,
    printer: Option<Arc<dyn PrintChannel>>,
}

impl CoreStateBuilder {
    pub fn auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn printer(mut self, printer: Arc<dyn PrintChannel>) -> Self {
        self.printer = Some(printer);
        self
    }

    pub fn build(self) -> CoreState {
        let Self {
            config,
            store,
            auth,
            printer,
        } = self;
        let tz = config.timezone;
        let auth = auth.unwrap_or_else(|| Arc::new(LocalAuthProvider::new()));
        let settings = SettingsService::new(store.clone());
        let coupons = CouponAllocator::new(store.clone(), config.coupon_ceiling);

        CoreState {
            accounts: Arc::new(AccountService::new(auth, store.clone())),
            catalog: CounterCatalog::new(store.clone()),
            counter_orders: CounterOrders::new(
                store.clone(),
                coupons.clone(),
                settings.clone(),
                printer.clone(),
                tz,
            ),
            running_coupons: RunningCoupons::new(store.clone(), settings.clone()),
            cleanup: DailyCleanup::new(store.clone()),
            menu: MenuService::new(store.clone()),
            tables: RunningTables::new(store.clone(), settings.clone()),
            billing: Billing::new(store.clone(), settings.clone(), printer),
            kitchen: KitchenBoard::new(store.clone()),
            counter_analytics: CounterAnalytics::new(store.clone(), tz),
            hotel_analytics: HotelAnalytics::new(store.clone(), tz),
            kitchen_analytics: KitchenAnalytics::new(store.clone(), tz),
            settings,
            coupons,
            store,
            config,
        }
    }
}

/// Live views of one signed-in session
///
/// 登出时调用 [`SessionViews::stop`]，取消所有订阅循环和高亮定时器。
pub struct SessionViews {
    tasks: BackgroundTasks,
    /// 柜台租户登录时的清理结果
    pub cleanup: Option<CleanupOutcome>,
    /// 厨房看板 / 柜台显示屏的新单高亮
    pub highlights: Arc<HighlightSet>,
    /// 新取号的 couponId，或新做好的桌号
    pub arrivals: mpsc::Receiver<String>,
}

impl SessionViews {
    pub fn check_health(&self) -> usize {
        self.tasks.check_health()
    }

    pub async fn stop(self) {
        self.highlights.clear();
        self.tasks.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SignUp;
    use crate::counter::{CartItem, PlaceOrder};
    use shared::models::{OrderType, PaymentMethod};
    use std::time::Duration;

    fn config() -> Config {
        let mut config = Config::with_overrides("/tmp/thali-unused", chrono_tz::Asia::Kolkata);
        config.counter_highlight_ms = 200;
        config
    }

    #[tokio::test]
    async fn test_counter_session_views() {
        let state = CoreState::in_memory(config());
        let session = state
            .accounts
            .sign_up(SignUp {
                email: "counter@hotel.in".into(),
                password: "secret1".into(),
                system_type: SystemType::Counter,
                admin_username: None,
                admin_password: None,
            })
            .await
            .unwrap();

        let mut views = state.start_session(&session).await.unwrap();
        assert!(matches!(views.cleanup, Some(CleanupOutcome::Swept { .. })));
        // 等视图拿到首个快照
        tokio::time::sleep(Duration::from_millis(50)).await;

        let placed = state
            .counter_orders
            .place(
                &session,
                PlaceOrder {
                    items: vec![CartItem {
                        name: "Tea".into(),
                        name_local: None,
                        price: 10.0,
                        quantity: 1,
                    }],
                    order_type: OrderType::Table,
                    payment: PaymentMethod::Cash,
                },
            )
            .await
            .unwrap();

        let coupon = tokio::time::timeout(Duration::from_secs(2), views.arrivals.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(coupon, "01");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(views.highlights.is_highlighted(&placed.order_id));
        assert_eq!(views.check_health(), 0);
        views.stop().await;
    }

    #[tokio::test]
    async fn test_counter_login_keeps_existing_coupons_quiet() {
        let state = CoreState::in_memory(config());
        let session = state
            .accounts
            .sign_up(SignUp {
                email: "reload@hotel.in".into(),
                password: "secret1".into(),
                system_type: SystemType::Counter,
                admin_username: None,
                admin_password: None,
            })
            .await
            .unwrap();
        let scope = session.scope().unwrap().clone();
        // 当天已清理过，登录时不会删掉下面这张单
        state.cleanup.run(&scope, today(state.timezone())).await.unwrap();

        let placed = state
            .counter_orders
            .place(
                &session,
                PlaceOrder {
                    items: vec![CartItem {
                        name: "Coffee".into(),
                        name_local: None,
                        price: 15.0,
                        quantity: 1,
                    }],
                    order_type: OrderType::Table,
                    payment: PaymentMethod::Online,
                },
            )
            .await
            .unwrap();

        let mut views = state.start_session(&session).await.unwrap();
        assert!(matches!(views.cleanup, Some(CleanupOutcome::Skipped)));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!views.highlights.is_highlighted(&placed.order_id));
        assert!(views.arrivals.try_recv().is_err());
        views.stop().await;
    }

    #[tokio::test]
    async fn test_start_session_after_sign_out() {
        let state = CoreState::in_memory(config());
        let session = state
            .accounts
            .sign_up(SignUp {
                email: "table@hotel.in".into(),
                password: "secret1".into(),
                system_type: SystemType::Table,
                admin_username: None,
                admin_password: None,
            })
            .await
            .unwrap();
        session.sign_out();
        assert!(state.start_session(&session).await.is_err());
    }
}
