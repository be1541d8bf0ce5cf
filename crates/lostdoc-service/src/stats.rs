//! Dashboard statistics. Visible to every authenticated user.

use lostdoc_core::{
  Result,
  stats::{DashboardStats, ItemCount, MONTH_LABELS, MonthlyIssuance, UtcRange, local_year_month},
  store::{DocumentQuery, DocumentStore},
};

use crate::{DocumentService, store_err};

impl<S: DocumentStore> DocumentService<S> {
  /// Reports issued today, this month and this year in the office calendar,
  /// plus the number of active users.
  pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
    let config = self.config.current().await?;
    let now = self.now();
    let tz = config.timezone;
    let (year, month) = local_year_month(now, tz);

    let reports_today = self.count_in(UtcRange::day(now, tz)?).await?;
    let reports_this_month = self.count_in(UtcRange::month(year, month, tz)?).await?;
    let reports_this_year = self.count_in(UtcRange::year(year, tz)?).await?;

    let users = self.store.list_users().await.map_err(store_err)?;
    let total_users = users.iter().filter(|u| u.active).count() as u64;

    Ok(DashboardStats {
      reports_today,
      reports_this_month,
      reports_this_year,
      total_users,
    })
  }

  /// Twelve monthly counts for the current office year.
  pub async fn monthly_issuance(&self) -> Result<MonthlyIssuance> {
    let config = self.config.current().await?;
    let (year, _) = local_year_month(self.now(), config.timezone);

    let mut counts = Vec::with_capacity(MONTH_LABELS.len());
    for month in 1..=12 {
      counts.push(self.count_in(UtcRange::month(year, month, config.timezone)?).await?);
    }

    Ok(MonthlyIssuance {
      year,
      labels: MONTH_LABELS.iter().map(|l| (*l).to_owned()).collect(),
      counts,
    })
  }

  pub async fn item_composition(&self) -> Result<Vec<ItemCount>> {
    self.store.item_composition().await.map_err(store_err)
  }

  async fn count_in(&self, range: UtcRange) -> Result<u64> {
    let query = DocumentQuery {
      reported_from: Some(range.from),
      reported_before: Some(range.before),
      ..Default::default()
    };
    self.store.count_documents(&query).await.map_err(store_err)
  }
}
