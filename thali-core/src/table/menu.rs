//! Menu (table flow)

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{MenuItem, MenuType};
use std::sync::Arc;

use crate::store::{Collection, DocumentStore, DocumentStoreExt, Query, Record, TenantScope};
use crate::utils::money::validate_price;
use crate::utils::validation::{MAX_NAME_LEN, validate_optional_text, validate_required_text};

use super::running::OrderLine;

#[derive(Clone)]
pub struct MenuService {
    store: Arc<dyn DocumentStore>,
}

impl MenuService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn add(&self, scope: &TenantScope, item: MenuItem) -> AppResult<String> {
        validate_menu_item(&item)?;
        let id = self.store.add_as(scope, Collection::Menu, &item).await?;
        tracing::info!(tenant = %scope, id = %id, name = %item.name, "Menu item created");
        Ok(id)
    }

    pub async fn update(&self, scope: &TenantScope, id: &str, item: MenuItem) -> AppResult<()> {
        validate_menu_item(&item)?;
        self.get(scope, id).await?;
        self.store.set_as(scope, Collection::Menu, id, &item).await?;
        Ok(())
    }

    pub async fn delete(&self, scope: &TenantScope, id: &str) -> AppResult<()> {
        self.store.delete(scope, Collection::Menu, id).await?;
        tracing::info!(tenant = %scope, id, "Menu item deleted");
        Ok(())
    }

    pub async fn get(&self, scope: &TenantScope, id: &str) -> AppResult<MenuItem> {
        self.store
            .get_as::<MenuItem>(scope, Collection::Menu, id)
            .await?
            .map(|r| r.data)
            .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound).with_detail("id", id))
    }

    /// Menu items, optionally of one type, ordered by name
    pub async fn list(
        &self,
        scope: &TenantScope,
        menu_type: Option<MenuType>,
    ) -> AppResult<Vec<Record<MenuItem>>> {
        let mut items = self
            .store
            .list_as::<MenuItem>(scope, Collection::Menu, &Query::all())
            .await?;
        if let Some(t) = menu_type {
            items.retain(|r| r.data.menu_type == t);
        }
        items.sort_by(|a, b| a.data.name.cmp(&b.data.name));
        Ok(items)
    }
}

/// Order line for a menu item, priced per the `acPerItem` setting
pub fn order_line(item: &MenuItem, quantity: i32, ac_per_item: bool) -> OrderLine {
    OrderLine {
        name: item.name.clone(),
        name_local: item.name_local.clone(),
        price: item.unit_price(ac_per_item),
        quantity,
    }
}

fn validate_menu_item(item: &MenuItem) -> AppResult<()> {
    validate_required_text(&item.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&item.name_local, "nameLocal", MAX_NAME_LEN)?;
    validate_price(item.price, "price")?;
    if let Some(p) = item.ac_price {
        validate_price(p, "acPrice")?;
    }
    if let Some(p) = item.non_ac_price {
        validate_price(p, "nonAcPrice")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn item(name: &str, menu_type: MenuType) -> MenuItem {
        MenuItem {
            name: name.into(),
            name_local: None,
            price: 40.0,
            ac_price: Some(50.0),
            non_ac_price: None,
            menu_type,
            availability: true,
        }
    }

    #[tokio::test]
    async fn test_list_by_type() {
        let menu = MenuService::new(Arc::new(MemoryStore::new()));
        let t = TenantScope::new("t1");
        menu.add(&t, item("Poha", MenuType::Breakfast)).await.unwrap();
        menu.add(&t, item("Lassi", MenuType::Drink)).await.unwrap();
        menu.add(&t, item("Chai", MenuType::Drink)).await.unwrap();

        let drinks = menu.list(&t, Some(MenuType::Drink)).await.unwrap();
        let names: Vec<_> = drinks.iter().map(|r| r.data.name.as_str()).collect();
        assert_eq!(names, vec!["Chai", "Lassi"]);
        assert_eq!(menu.list(&t, None).await.unwrap().len(), 3);
    }

    #[test]
    fn test_order_line_pricing() {
        let poha = item("Poha", MenuType::Breakfast);
        assert_eq!(order_line(&poha, 1, true).price, 50.0);
        assert_eq!(order_line(&poha, 1, false).price, 40.0);
    }

    #[tokio::test]
    async fn test_update_missing() {
        let menu = MenuService::new(Arc::new(MemoryStore::new()));
        let err = menu
            .update(&TenantScope::new("t1"), "nope", item("Poha", MenuType::Meal))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }
}
