//! Tenant settings
//!
//! `settings` 集合下的固定文档：
//!
//! | 文档 | 内容 |
//! |------|------|
//! | `userSettings` | 分类计数、本地打印、按项 AC 价、深色模式 |
//! | `hotelInfo` | 店名、GST、AC/非 AC 桌台范围与附加费 |
//! | `topItems` | 柜台热门商品列表 |
//! | `lastCouponClear` | 每日清理标记 |
//!
//! 文档不存在时返回默认值。

mod debounce;

pub use debounce::DebouncedWriter;

use futures::FutureExt;
use shared::error::{AppError, AppResult};
use shared::models::{HotelInfo, TopItems, UserSettings};
use std::sync::Arc;
use std::time::Duration;

use crate::store::{Collection, DocumentStore, DocumentStoreExt, TenantScope};
use crate::utils::money::{validate_price, validate_tax_percentage};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};

pub const USER_SETTINGS_DOC: &str = "userSettings";
pub const HOTEL_INFO_DOC: &str = "hotelInfo";
pub const TOP_ITEMS_DOC: &str = "topItems";
pub const CLEANUP_MARKER_DOC: &str = "lastCouponClear";

/// 柜台热门商品最多三个
pub const MAX_TOP_ITEMS: usize = 3;

/// Settings repository
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn DocumentStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn user_settings(&self, scope: &TenantScope) -> AppResult<UserSettings> {
        Ok(self
            .store
            .get_as::<UserSettings>(scope, Collection::Settings, USER_SETTINGS_DOC)
            .await?
            .map(|r| r.data)
            .unwrap_or_default())
    }

    pub async fn save_user_settings(
        &self,
        scope: &TenantScope,
        settings: &UserSettings,
    ) -> AppResult<()> {
        self.store
            .set_as(scope, Collection::Settings, USER_SETTINGS_DOC, settings)
            .await?;
        tracing::debug!(tenant = %scope, ?settings, "User settings saved");
        Ok(())
    }

    /// Debounced writer for settings toggles
    ///
    /// 连续切换只落盘最后一次
    pub fn user_settings_writer(
        &self,
        scope: TenantScope,
        window: Duration,
    ) -> DebouncedWriter<UserSettings> {
        let service = self.clone();
        DebouncedWriter::new(window, move |settings: UserSettings| {
            let service = service.clone();
            let scope = scope.clone();
            async move { service.save_user_settings(&scope, &settings).await }.boxed()
        })
    }

    pub async fn hotel_info(&self, scope: &TenantScope) -> AppResult<HotelInfo> {
        Ok(self
            .store
            .get_as::<HotelInfo>(scope, Collection::Settings, HOTEL_INFO_DOC)
            .await?
            .map(|r| r.data)
            .unwrap_or_default())
    }

    pub async fn save_hotel_info(&self, scope: &TenantScope, info: &HotelInfo) -> AppResult<()> {
        validate_hotel_info(info)?;
        self.store
            .set_as(scope, Collection::Settings, HOTEL_INFO_DOC, info)
            .await
            .inspect_err(|e| tracing::error!(tenant = %scope, error = %e, "Failed to save hotel info"))?;
        tracing::info!(tenant = %scope, hotel = %info.hotel_name, "Hotel info saved");
        Ok(())
    }

    pub async fn top_items(&self, scope: &TenantScope) -> AppResult<TopItems> {
        Ok(self
            .store
            .get_as::<TopItems>(scope, Collection::Settings, TOP_ITEMS_DOC)
            .await?
            .map(|r| r.data)
            .unwrap_or_default())
    }

    /// Replace the top-item list (names trimmed, blanks and duplicates dropped)
    pub async fn save_top_items(&self, scope: &TenantScope, names: &[String]) -> AppResult<TopItems> {
        let mut items: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim();
            if !name.is_empty() && !items.iter().any(|n| n == name) {
                items.push(name.to_string());
            }
        }
        if items.len() > MAX_TOP_ITEMS {
            return Err(AppError::validation(format!(
                "at most {MAX_TOP_ITEMS} top items, got {}",
                items.len()
            )));
        }
        let top = TopItems { items };
        self.store
            .set_as(scope, Collection::Settings, TOP_ITEMS_DOC, &top)
            .await?;
        Ok(top)
    }
}

fn validate_range(range: &str, field: &str) -> AppResult<()> {
    if range.trim().is_empty() {
        return Ok(());
    }
    let parsed = range
        .split_once('-')
        .and_then(|(a, b)| Some((a.trim().parse::<u32>().ok()?, b.trim().parse::<u32>().ok()?)));
    match parsed {
        Some((start, end)) if start <= end => Ok(()),
        _ => Err(AppError::validation(format!(
            "{field} must look like \"1-10\", got \"{range}\""
        ))),
    }
}

fn validate_hotel_info(info: &HotelInfo) -> AppResult<()> {
    validate_required_text(&info.hotel_name, "hotelName", MAX_NAME_LEN)?;
    validate_optional_text(&info.address, "address", MAX_NOTE_LEN)?;
    validate_optional_text(&info.gst_number, "gstNumber", MAX_NAME_LEN)?;
    validate_tax_percentage(info.gst_percentage)?;
    validate_price(info.ac_charge, "acCharge")?;
    validate_price(info.non_ac_charge, "nonAcCharge")?;
    validate_range(&info.ac_tables, "acTables")?;
    validate_range(&info.non_ac_tables, "nonAcTables")?;
    if info.greeting.len() > MAX_NOTE_LEN {
        return Err(AppError::validation("greeting is too long"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::error::ErrorCode;

    fn service() -> SettingsService {
        SettingsService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let s = service();
        let t = TenantScope::new("t1");
        assert_eq!(s.user_settings(&t).await.unwrap(), UserSettings::default());
        assert!(s.top_items(&t).await.unwrap().items.is_empty());
        assert_eq!(s.hotel_info(&t).await.unwrap().gst_percentage, 0.0);
    }

    #[tokio::test]
    async fn test_hotel_info_validation() {
        let s = service();
        let t = TenantScope::new("t1");
        let mut info = HotelInfo {
            hotel_name: "Annapurna".into(),
            gst_percentage: 5.0,
            ac_tables: "1-10".into(),
            non_ac_tables: "11-20".into(),
            ..Default::default()
        };
        s.save_hotel_info(&t, &info).await.unwrap();

        info.ac_tables = "10-1".into();
        assert!(s.save_hotel_info(&t, &info).await.is_err());

        info.ac_tables = "1-10".into();
        info.gst_percentage = 140.0;
        let err = s.save_hotel_info(&t, &info).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTaxRate);
    }

    #[tokio::test]
    async fn test_top_items_dedup() {
        let s = service();
        let t = TenantScope::new("t1");
        let saved = s
            .save_top_items(&t, &["Tea".into(), " Tea ".into(), "".into(), "Samosa".into()])
            .await
            .unwrap();
        assert_eq!(saved.items, vec!["Tea".to_string(), "Samosa".to_string()]);
        assert_eq!(s.top_items(&t).await.unwrap(), saved);

        let too_many: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert!(s.save_top_items(&t, &too_many).await.is_err());
    }
}
