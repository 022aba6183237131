//! Thali - 餐厅收银核心库
//!
//! # 架构概述
//!
//! 两种租户流程共用一个多租户文档存储：
//!
//! - **柜台 (Counter)**: 取号下单、每日取号计数、当日流水、柜台显示屏
//! - **堂食 (Table)**: 桌台点单、厨房单 (KOT)、结账、收款
//!
//! 所有写入都带 [`store::TenantScope`]；实时视图由订阅快照 + 差异计算驱动。
//!
//! # 模块结构
//!
//! ```text
//! thali-core/src/
//! ├── core/        # 配置、会话、后台任务、服务门面
//! ├── store/       # 文档存储 (memory / redb)、查询、订阅
//! ├── auth/        # 认证提供方、租户档案、管理员解锁
//! ├── coupon/      # 每日取号
//! ├── counter/     # 柜台商品、订单、取号列表、每日清理
//! ├── table/       # 菜单、桌台、账单
//! ├── kitchen/     # 厨房看板
//! ├── view/        # 快照差异、高亮、到达通知
//! ├── printing/    # 打印通道 (原生桥 / 打印对话框)
//! ├── settings/    # 用户设置、酒店信息、常用商品
//! ├── analytics/   # 报表聚合
//! └── utils/       # 日志、金额、时间、校验
//! ```

pub mod analytics;
pub mod auth;
pub mod core;
pub mod counter;
pub mod coupon;
pub mod kitchen;
pub mod printing;
pub mod settings;
pub mod store;
pub mod table;
pub mod utils;
pub mod view;

// Re-export 公共类型
pub use auth::{AccountService, AuthProvider, AuthUser, LocalAuthProvider, SignUp};
pub use core::{BackgroundTasks, Config, CoreState, SessionContext, SessionViews};
pub use store::{Collection, DocumentStore, DocumentStoreExt, MemoryStore, Query, RedbStore, TenantScope};
pub use utils::{AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_from_config, init_logger, init_logger_with_file};
