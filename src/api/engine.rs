use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, trace};

use crate::core::{
    ColorAssignment, ColorPool, HexColor, OrderingStrategy, ProportionSample, RawRow,
    ScaledSample, TotalSample, VariantId, VariantOrder, VariantSchema, assign, extract_schema,
    join_with_policy, normalize_proportions, normalize_totals, order_variants, regenerate, shuffle,
};
use crate::error::StackResult;

use super::{DisplayMode, EngineConfig, LoadReport, SeriesSource};

/// Series selected by the current [`DisplayMode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplaySeries<'a> {
    Proportions(&'a [ProportionSample]),
    Absolute(&'a [ScaledSample]),
}

impl DisplaySeries<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Proportions(samples) => samples.len(),
            Self::Absolute(samples) => samples.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One stacked layer in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackLayer<'a> {
    pub id: &'a VariantId,
    pub color: &'a HexColor,
}

/// Owns one loaded dataset together with its current order and palette.
///
/// The scaled series is rebuilt whenever either source series is replaced.
/// Order and colors only change on explicit calls.
#[derive(Debug, Clone)]
pub struct VariantStackEngine {
    config: EngineConfig,
    schema: VariantSchema,
    proportions: Vec<ProportionSample>,
    totals: Vec<TotalSample>,
    scaled: Vec<ScaledSample>,
    unmatched: Vec<DateTime<Utc>>,
    order: VariantOrder,
    palette: ColorPool,
    colors: ColorAssignment,
    load_report: Option<LoadReport>,
}

impl VariantStackEngine {
    /// Builds the dataset from raw rows and draws the initial palette from `rng`.
    pub fn from_rows<R: Rng + ?Sized>(
        config: EngineConfig,
        proportion_rows: &[RawRow],
        total_rows: &[RawRow],
        rng: &mut R,
    ) -> StackResult<Self> {
        config.validate()?;
        let schema = extract_schema(proportion_rows, &config.proportion_date_field)?;
        let proportions = normalize_proportions(
            proportion_rows,
            &schema,
            &config.proportion_date_field,
            config.missing_field_policy,
        )?;
        let totals = normalize_totals(total_rows, &config.total_date_field, &config.total_fields)?;
        let report = join_with_policy(&proportions, &totals, config.join_policy)?;
        let order = order_variants(&report.samples, &schema, config.ordering, &config.pins);
        let palette = regenerate(config.palette_size.max(schema.len()), rng);
        let colors = assign(&palette, schema.iter())?;

        debug!(
            variants = schema.len(),
            proportions = proportions.len(),
            totals = totals.len(),
            scaled = report.samples.len(),
            "loaded variant dataset"
        );
        Ok(Self {
            config,
            schema,
            proportions,
            totals,
            scaled: report.samples,
            unmatched: report.unmatched,
            order,
            palette,
            colors,
            load_report: None,
        })
    }

    /// Pulls both series from `source` and records their origins.
    pub fn from_source<S, R>(config: EngineConfig, source: &mut S, rng: &mut R) -> StackResult<Self>
    where
        S: SeriesSource + ?Sized,
        R: Rng + ?Sized,
    {
        let proportions = source.load_proportions()?;
        let totals = source.load_totals()?;
        let mut engine = Self::from_rows(config, &proportions.rows, &totals.rows, rng)?;
        let report = LoadReport {
            proportions: proportions.origin,
            totals: totals.origin,
        };
        if report.is_partial() {
            debug!(?report, "dataset loaded with bundled fallback");
        }
        engine.load_report = Some(report);
        Ok(engine)
    }

    /// Replaces the proportion series. Rows must match the loaded schema.
    pub fn set_proportion_rows(&mut self, rows: &[RawRow]) -> StackResult<()> {
        let proportions = normalize_proportions(
            rows,
            &self.schema,
            &self.config.proportion_date_field,
            self.config.missing_field_policy,
        )?;
        self.rejoin(proportions, self.totals.clone())
    }

    /// Replaces the totals series.
    pub fn set_total_rows(&mut self, rows: &[RawRow]) -> StackResult<()> {
        let totals = normalize_totals(
            rows,
            &self.config.total_date_field,
            &self.config.total_fields,
        )?;
        self.rejoin(self.proportions.clone(), totals)
    }

    fn rejoin(
        &mut self,
        proportions: Vec<ProportionSample>,
        totals: Vec<TotalSample>,
    ) -> StackResult<()> {
        let report = join_with_policy(&proportions, &totals, self.config.join_policy)?;
        trace!(scaled = report.samples.len(), "rejoined series");
        self.proportions = proportions;
        self.totals = totals;
        self.scaled = report.samples;
        self.unmatched = report.unmatched;
        Ok(())
    }

    /// Recomputes the order with `strategy` and keeps it as the active strategy.
    pub fn apply_ordering(&mut self, strategy: OrderingStrategy) -> &VariantOrder {
        self.order = order_variants(&self.scaled, &self.schema, strategy, &self.config.pins);
        self.config.ordering = strategy;
        debug!(?strategy, "applied variant ordering");
        &self.order
    }

    /// Shuffles the current order. Colors stay with their variants.
    pub fn shuffle_order<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &VariantOrder {
        self.order = shuffle(&self.order, &self.config.pins, rng);
        debug!("shuffled variant order");
        &self.order
    }

    /// Draws a fresh palette, changing every assignment.
    pub fn randomize_colors<R: Rng + ?Sized>(&mut self, rng: &mut R) -> StackResult<&ColorAssignment> {
        let palette = regenerate(self.config.palette_size.max(self.schema.len()), rng);
        self.set_palette(palette)
    }

    /// Installs a caller-provided palette.
    pub fn set_palette(&mut self, palette: ColorPool) -> StackResult<&ColorAssignment> {
        self.colors = assign(&palette, self.schema.iter())?;
        self.palette = palette;
        debug!(colors = self.palette.len(), "replaced color palette");
        Ok(&self.colors)
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.config.display_mode = mode;
    }

    #[must_use]
    pub fn display_mode(&self) -> DisplayMode {
        self.config.display_mode
    }

    #[must_use]
    pub fn displayed_series(&self) -> DisplaySeries<'_> {
        match self.config.display_mode {
            DisplayMode::Proportions => DisplaySeries::Proportions(&self.proportions),
            DisplayMode::Absolute => DisplaySeries::Absolute(&self.scaled),
        }
    }

    /// Variants with their colors, in the current order.
    #[must_use]
    pub fn layers(&self) -> Vec<StackLayer<'_>> {
        self.order
            .iter()
            .filter_map(|id| {
                self.colors
                    .get(id.as_str())
                    .map(|color| StackLayer { id, color })
            })
            .collect()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn schema(&self) -> &VariantSchema {
        &self.schema
    }

    #[must_use]
    pub fn proportions(&self) -> &[ProportionSample] {
        &self.proportions
    }

    #[must_use]
    pub fn totals(&self) -> &[TotalSample] {
        &self.totals
    }

    #[must_use]
    pub fn scaled(&self) -> &[ScaledSample] {
        &self.scaled
    }

    /// Proportion dates that had no total under a skip or zero-fill policy.
    #[must_use]
    pub fn unmatched_dates(&self) -> &[DateTime<Utc>] {
        &self.unmatched
    }

    #[must_use]
    pub fn order(&self) -> &VariantOrder {
        &self.order
    }

    #[must_use]
    pub fn colors(&self) -> &ColorAssignment {
        &self.colors
    }

    #[must_use]
    pub fn palette(&self) -> &ColorPool {
        &self.palette
    }

    #[must_use]
    pub fn load_report(&self) -> Option<LoadReport> {
        self.load_report
    }
}
