//! Writing orders together with their line items

use tracing::{error, info, instrument};

use crate::filters::same_id;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::require_field;

/// Saves order headers and lines, and records line removals
pub struct OrderWriter<S> {
    storage: S,
}

impl<S: OrderRepository> OrderWriter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Insert the order header, then its lines
    ///
    /// The two writes are not atomic. When the line insert fails the header
    /// stays saved and `PartialWrite` names it so the caller can surface the
    /// incomplete order.
    #[instrument(skip(self, order), fields(order_uuid = %order.uuid))]
    pub async fn create_with_items(&self, mut order: Order) -> ProcurementResult<Order> {
        require_field("corporation_uuid", &order.corporation_uuid)?;
        require_field("project_uuid", &order.project_uuid)?;

        for item in order.items.iter_mut() {
            if item.item_uuid.as_deref().map_or(true, |uuid| uuid.trim().is_empty()) {
                item.item_uuid = Some(uuid::Uuid::new_v4().to_string());
            }
        }

        self.storage.insert_order(&order).await?;

        if let Err(err) = self
            .storage
            .insert_order_items(&order.uuid, &order.items)
            .await
        {
            error!(order_uuid = %order.uuid, error = %err, "order saved without its line items");
            return Err(ProcurementError::PartialWrite {
                parent_uuid: order.uuid,
                message: err.to_string(),
            });
        }

        info!(order_uuid = %order.uuid, items = order.items.len(), "order created");
        Ok(order)
    }

    /// Soft-delete a line by adding it to the order's removed-items manifest
    #[instrument(skip(self))]
    pub async fn remove_item(&self, order_uuid: &str, item_uuid: &str) -> ProcurementResult<Order> {
        require_field("item_uuid", item_uuid)?;

        let mut order = self
            .storage
            .get_order(order_uuid)
            .await?
            .ok_or_else(|| ProcurementError::NotFound(order_uuid.to_string()))?;

        let already_removed = order.removed_items.iter().any(|entry| {
            entry
                .item_uuid
                .as_deref()
                .is_some_and(|removed| same_id(removed, item_uuid))
        });
        if already_removed {
            return Ok(order);
        }

        let exists = order.items.iter().any(|item| {
            item.item_uuid
                .as_deref()
                .is_some_and(|uuid| same_id(uuid, item_uuid))
        });
        if !exists {
            return Err(ProcurementError::NotFound(format!(
                "item {} on order {}",
                item_uuid, order_uuid
            )));
        }

        order.removed_items.push(RemovedItem::now(item_uuid));
        self.storage.update_order(&order).await?;
        Ok(order)
    }
}
