use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::dsl::max;
use diesel::prelude::*;
use rust_decimal::Decimal;

use adledger_core::campaigns::{CampaignAggregateTrait, SalesAggregate};
use adledger_core::tracking::{SalesStatus, TrackingRecord, TrackingRepositoryTrait};
use adledger_core::Result;

use super::model::{format_timestamp, parse_decimal_tolerant, parse_timestamp, TrackingRecordDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::tracking_records;

/// Repository for the canonical tracking records table.
///
/// Reads go straight to the pool; every write is funneled through the
/// single-writer actor so each upsert runs in its own immediate transaction.
pub struct TrackingRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl TrackingRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn window_cutoff(window: Duration) -> String {
        format_timestamp(&(Utc::now() - window))
    }
}

#[async_trait]
impl TrackingRepositoryTrait for TrackingRepository {
    fn get(&self, id: &str) -> Result<Option<TrackingRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let row = tracking_records::table
            .find(id.to_string())
            .select(TrackingRecordDB::as_select())
            .first::<TrackingRecordDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(TrackingRecord::from))
    }

    fn filter_existing_ids(&self, ids: &HashSet<String>) -> Result<HashSet<String>> {
        let mut conn = get_connection(&self.pool)?;
        let candidates: Vec<String> = ids.iter().cloned().collect();
        let found: Vec<String> = tracking_records::table
            .filter(tracking_records::id.eq_any(candidates))
            .select(tracking_records::id)
            .load::<String>(&mut conn)
            .into_core()?;
        Ok(found.into_iter().collect())
    }

    fn range_by_updated_at(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TrackingRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = tracking_records::table
            .select(TrackingRecordDB::as_select())
            .into_boxed();
        if let Some(from) = from {
            query = query.filter(tracking_records::updated_at.ge(format_timestamp(&from)));
        }
        if let Some(to) = to {
            query = query.filter(tracking_records::updated_at.le(format_timestamp(&to)));
        }

        let rows = query
            .order(tracking_records::updated_at.asc())
            .limit(limit)
            .offset(offset)
            .load::<TrackingRecordDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(TrackingRecord::from).collect())
    }

    fn range_by_updated_at_paged(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<TrackingRecord>, i64)> {
        let mut conn = get_connection(&self.pool)?;

        let mut count_query = tracking_records::table.into_boxed();
        if let Some(from) = from {
            count_query = count_query.filter(tracking_records::updated_at.ge(format_timestamp(&from)));
        }
        if let Some(to) = to {
            count_query = count_query.filter(tracking_records::updated_at.le(format_timestamp(&to)));
        }
        let total = count_query.count().get_result::<i64>(&mut conn).into_core()?;

        let data = self.range_by_updated_at(from, to, limit, offset)?;
        Ok((data, total))
    }

    fn range_by_campaign_items(
        &self,
        items: &[String],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TrackingRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = tracking_records::table
            .filter(tracking_records::campaign_item.eq_any(items.to_vec()))
            .order(tracking_records::updated_at.asc())
            .limit(limit)
            .offset(offset)
            .select(TrackingRecordDB::as_select())
            .load::<TrackingRecordDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(TrackingRecord::from).collect())
    }

    fn max_updated_at_excluding(&self, hotkey: &str) -> Result<Option<DateTime<Utc>>> {
        let mut conn = get_connection(&self.pool)?;
        let newest: Option<String> = tracking_records::table
            .filter(
                tracking_records::validator_hotkey
                    .is_null()
                    .or(tracking_records::validator_hotkey.ne(hotkey.to_string())),
            )
            .select(max(tracking_records::updated_at))
            .first::<Option<String>>(&mut conn)
            .into_core()?;
        Ok(newest.map(|s| parse_timestamp(&s, "updated_at")))
    }

    async fn upsert(&self, record: TrackingRecord) -> Result<TrackingRecord> {
        let mut row = TrackingRecordDB::from(&record);
        self.writer
            .exec(move |conn| {
                let existing = tracking_records::table
                    .find(row.id.clone())
                    .select(TrackingRecordDB::as_select())
                    .first::<TrackingRecordDB>(conn)
                    .optional()
                    .into_core()?;

                row.updated_at = format_timestamp(&Utc::now());
                match existing {
                    None => {
                        diesel::insert_into(tracking_records::table)
                            .values(&row)
                            .execute(conn)
                            .into_core()?;
                    }
                    Some(prev) => {
                        row.preserve_origin(&prev);
                        diesel::update(tracking_records::table.find(row.id.clone()))
                            .set(&row)
                            .execute(conn)
                            .into_core()?;
                    }
                }

                let saved = tracking_records::table
                    .find(row.id.clone())
                    .select(TrackingRecordDB::as_select())
                    .first::<TrackingRecordDB>(conn)
                    .into_core()?;
                Ok(TrackingRecord::from(saved))
            })
            .await
    }

    async fn mark_completed_before(
        &self,
        campaign_id: &str,
        sale_cutoff: DateTime<Utc>,
    ) -> Result<usize> {
        let campaign = campaign_id.to_string();
        let cutoff = format_timestamp(&sale_cutoff);
        self.writer
            .exec(move |conn| {
                let now = format_timestamp(&Utc::now());
                diesel::update(
                    tracking_records::table
                        .filter(tracking_records::campaign_id.eq(campaign))
                        .filter(tracking_records::sale_date.is_not_null())
                        .filter(tracking_records::sale_date.lt(cutoff))
                        .filter(tracking_records::sales_status.ne(SalesStatus::Completed.as_str())),
                )
                .set((
                    tracking_records::sales_status.eq(SalesStatus::Completed.as_str()),
                    tracking_records::updated_at.eq(now),
                ))
                .execute(conn)
                .into_core()
            })
            .await
    }
}

#[async_trait]
impl CampaignAggregateTrait for TrackingRepository {
    async fn campaign_sales(&self, campaign_id: &str, window: Duration) -> Result<SalesAggregate> {
        let mut conn = get_connection(&self.pool)?;
        let amounts: Vec<String> = tracking_records::table
            .filter(tracking_records::campaign_id.eq(campaign_id.to_string()))
            .filter(tracking_records::sales_count.gt(0))
            .filter(tracking_records::sale_date.is_not_null())
            .filter(tracking_records::sale_date.ge(Self::window_cutoff(window)))
            .select(tracking_records::net_sale_amount)
            .load::<String>(&mut conn)
            .into_core()?;

        let total_amount: Decimal = amounts
            .iter()
            .map(|s| parse_decimal_tolerant(s, "net_sale_amount"))
            .sum();
        Ok(SalesAggregate {
            count: amounts.len() as i64,
            total_amount,
        })
    }

    async fn campaign_visits(&self, campaign_id: &str, window: Duration) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        tracking_records::table
            .filter(tracking_records::campaign_id.eq(campaign_id.to_string()))
            .filter(tracking_records::created_at.ge(Self::window_cutoff(window)))
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }

    async fn campaign_refunds(&self, campaign_id: &str, window: Duration) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        tracking_records::table
            .filter(tracking_records::campaign_id.eq(campaign_id.to_string()))
            .filter(tracking_records::refund_count.gt(0))
            .filter(tracking_records::updated_at.ge(Self::window_cutoff(window)))
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }

    async fn sales_summary(&self, window: Duration) -> Result<SalesAggregate> {
        let mut conn = get_connection(&self.pool)?;
        let amounts: Vec<String> = tracking_records::table
            .filter(tracking_records::sales_count.gt(0))
            .filter(tracking_records::sale_date.is_not_null())
            .filter(tracking_records::sale_date.ge(Self::window_cutoff(window)))
            .select(tracking_records::net_sale_amount)
            .load::<String>(&mut conn)
            .into_core()?;

        let total_amount: Decimal = amounts
            .iter()
            .map(|s| parse_decimal_tolerant(s, "net_sale_amount"))
            .sum();
        Ok(SalesAggregate {
            count: amounts.len() as i64,
            total_amount,
        })
    }

    async fn refunds_summary(&self, window: Duration) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        tracking_records::table
            .filter(tracking_records::refund_count.gt(0))
            .filter(tracking_records::updated_at.ge(Self::window_cutoff(window)))
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }
}
