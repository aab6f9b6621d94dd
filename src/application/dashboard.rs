//! Full dashboard run: every requested pair, its history and its scraped quote

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::application::evaluation::EvaluationCycle;
use crate::domain::pair::PairId;
use crate::infrastructure::scrape::QuoteScraper;
use crate::infrastructure::sheets::{trend, HistoricalRow, RowLayout, SheetsClient};
use crate::report::{DashboardReport, HistoryView, PairReport, Section};

/// Sheet ranges holding one pair's history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRanges {
    pub pair: PairId,
    pub trend: String,
    pub trend_layout: RowLayout,
    pub history: String,
    pub history_layout: RowLayout,
}

/// Knobs for one dashboard run
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub trend_rows: usize,
    pub history_ranges: Vec<HistoryRanges>,
    pub quote_url: String,
    pub quote_selector: String,
    pub record: bool,
}

/// Wires the collaborators together; each pair is evaluated in turn
pub struct Dashboard<'a> {
    cycle: EvaluationCycle<'a>,
    scraper: Option<&'a QuoteScraper>,
    sheets: Option<&'a SheetsClient>,
    settings: DashboardSettings,
}

impl<'a> Dashboard<'a> {
    pub fn new(
        cycle: EvaluationCycle<'a>,
        scraper: Option<&'a QuoteScraper>,
        sheets: Option<&'a SheetsClient>,
        settings: DashboardSettings,
    ) -> Self {
        Self {
            cycle,
            scraper,
            sheets,
            settings,
        }
    }

    pub async fn run(&self, pairs: &[PairId], now: DateTime<Utc>) -> DashboardReport {
        let mut reports = Vec::with_capacity(pairs.len());
        for pair in pairs {
            reports.push(self.run_pair(*pair, now).await);
        }
        DashboardReport::new(now, reports)
    }

    async fn run_pair(&self, pair: PairId, now: DateTime<Utc>) -> PairReport {
        let spec = pair.spec();

        let mut quote = None;
        if spec.quote_page {
            if let Some(scraper) = self.scraper {
                quote = Some(
                    match scraper
                        .fetch_quote(&self.settings.quote_url, &self.settings.quote_selector)
                        .await
                    {
                        Ok(text) => Section::Ready(text),
                        Err(e) => {
                            warn!("Quote scrape for {} failed: {}", spec.label, e);
                            Section::failed(e)
                        }
                    },
                );
            }
        }

        let evaluation = match self.cycle.evaluate(&spec, now).await {
            Ok(evaluation) => Section::Ready(evaluation),
            Err(e) => {
                error!("Evaluation of {} aborted: {}", spec.label, e);
                Section::failed(e)
            }
        };

        let mut report = PairReport::new(&spec, self.cycle.lookback_weeks(), evaluation);
        report.quote = quote;

        let ranges = self.settings.history_ranges.iter().find(|r| r.pair == pair);
        if let (Some(sheets), Some(ranges)) = (self.sheets, ranges) {
            report.history = Some(self.load_history(sheets, ranges).await);

            if self.settings.record {
                if let Section::Ready(evaluation) = &report.evaluation {
                    let row = HistoricalRow::new(
                        now.format("%Y-%m-%d %H:%M:%S").to_string(),
                        evaluation.snapshot.estimated_fair_cross,
                        evaluation.snapshot.latest_cross,
                    );
                    report.recorded = Some(match sheets.append_row(&ranges.trend, ranges.trend_layout, &row).await {
                        Ok(()) => Section::Ready(ranges.trend.clone()),
                        Err(e) => {
                            error!("Recording {} snapshot failed: {}", spec.label, e);
                            Section::failed(e)
                        }
                    });
                }
            }
        } else if self.sheets.is_some() {
            info!("No sheet ranges configured for {}", spec.label);
        }

        report
    }

    async fn load_history(&self, sheets: &SheetsClient, ranges: &HistoryRanges) -> Section<HistoryView> {
        let n = self.settings.trend_rows;
        let trend_rows = match sheets.read_rows(&ranges.trend, ranges.trend_layout).await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Reading {} failed: {}", ranges.trend, e);
                return Section::failed(e);
            }
        };
        let table_rows = match sheets.read_rows(&ranges.history, ranges.history_layout).await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Reading {} failed: {}", ranges.history, e);
                return Section::failed(e);
            }
        };
        Section::Ready(HistoryView {
            trend: trend(&trend_rows.rows, n),
            table: trend(&table_rows.rows, n),
            skipped: trend_rows.skipped + table_rows.skipped,
        })
    }
}
