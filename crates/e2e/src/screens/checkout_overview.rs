use storefront_common::verifier::{verify_subtotal, verify_total, OrderSummary};
use storefront_common::{MoneyAmount, ScreenState};
use tracing::info;

use super::{read_amount, read_amounts, CompleteScreen, ITEM_PRICE};
use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, Resolver};
use crate::session::Session;

const SUBTOTAL_LABEL: &str = "subtotal-label";
const TAX_LABEL: &str = "tax-label";
const TOTAL_LABEL: &str = "total-label";
const FINISH: &str = "finish";

pub struct CheckoutOverviewScreen<'s> {
    session: &'s Session,
    resolver: Resolver<'s>,
}

impl<'s> CheckoutOverviewScreen<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            resolver: session.resolver(ScreenState::CheckoutOverview),
        }
    }

    /// Confirm the overview is shown. Safe to call repeatedly.
    pub async fn assert_reached(&self) -> E2eResult<()> {
        self.session
            .confirm_screen(self.resolver.screen(), ScreenState::CheckoutOverview, "assert_reached")
            .await
    }

    pub async fn read_subtotal_and_tax(&self) -> E2eResult<OrderSummary> {
        let item_subtotal = read_amount(
            &self.resolver,
            Locator::test_id(SUBTOTAL_LABEL),
            "read_subtotal_and_tax",
        )
        .await?;
        let tax = read_amount(&self.resolver, Locator::test_id(TAX_LABEL), "read_subtotal_and_tax").await?;
        Ok(OrderSummary { item_subtotal, tax })
    }

    pub async fn read_total(&self) -> E2eResult<MoneyAmount> {
        read_amount(&self.resolver, Locator::test_id(TOTAL_LABEL), "read_total").await
    }

    /// Prices of the ordered items in display order
    pub async fn read_item_prices(&self) -> E2eResult<Vec<MoneyAmount>> {
        read_amounts(&self.resolver, Locator::test_id(ITEM_PRICE), "read_item_prices").await
    }

    /// Check the rendered subtotal against the item prices and the rendered
    /// total against subtotal plus tax
    pub async fn verify_totals(&self) -> E2eResult<OrderSummary> {
        let prices = self.read_item_prices().await?;
        let summary = self.read_subtotal_and_tax().await?;
        let total = self.read_total().await?;

        let mismatch = |mismatch| E2eError::DerivedValueMismatch {
            screen: ScreenState::CheckoutOverview,
            mismatch,
        };
        verify_subtotal(&prices, summary.item_subtotal).map_err(mismatch)?;
        verify_total(&summary, total).map_err(mismatch)?;

        info!(
            subtotal = %summary.item_subtotal,
            tax = %summary.tax,
            total = %total,
            "Order totals agree"
        );
        Ok(summary)
    }

    pub async fn finish(self) -> E2eResult<CompleteScreen<'s>> {
        self.resolver
            .resolve(Locator::test_id(FINISH), "finish")
            .await?
            .click()
            .await?;
        self.session
            .confirm_screen(self.resolver.screen(), ScreenState::Complete, "finish")
            .await?;
        Ok(CompleteScreen::new(self.session))
    }
}
