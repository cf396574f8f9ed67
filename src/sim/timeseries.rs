//! Date/time stepping and the run state machine.
//!
//! [`TimeSeriesDriver`] walks a [`RunRequest`] schedule. At every step it sets
//! the sun from a [`SunDirectionProvider`], lets a [`StepEvaluator`] compute
//! the step in budgeted slices, and records the result. When the schedule is
//! exhausted it reduces the per-step percentages to a [`RunSummary`].

use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::sim::solar::{SunDirectionProvider, SunState};
use crate::sim::task::{Progress, ResumableTask};

/// Timestamp format of run requests, `dd/MM/yyyy HH:mm:ss`.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| Error::InputParse(format!("timestamp '{}': {}", text, e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepUnit {
    Minutes,
    Hours,
    Days,
}

impl StepUnit {
    pub fn duration(self, value: u32) -> Duration {
        let value = i64::from(value);
        match self {
            StepUnit::Minutes => Duration::minutes(value),
            StepUnit::Hours => Duration::hours(value),
            StepUnit::Days => Duration::days(value),
        }
    }
}

impl FromStr for StepUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minutes" => Ok(StepUnit::Minutes),
            "hours" => Ok(StepUnit::Hours),
            "days" => Ok(StepUnit::Days),
            other => Err(Error::Configuration(format!("invalid step unit: {}", other))),
        }
    }
}

/// Validated time range with a positive step.
///
/// A request always covers at least one step, at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    start: NaiveDateTime,
    end: NaiveDateTime,
    step: u32,
    unit: StepUnit,
}

impl RunRequest {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, step: u32, unit: StepUnit) -> Result<Self> {
        if step == 0 {
            return Err(Error::Configuration("step must be positive".to_string()));
        }
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self {
            start,
            end,
            step,
            unit,
        })
    }

    /// Parses the textual form of a request, e.g.
    /// `("01/01/2025 00:00:00", "01/01/2025 02:00:00", "60", "Minutes")`.
    pub fn parse(start: &str, end: &str, step: &str, unit: &str) -> Result<Self> {
        let start = parse_timestamp(start)?;
        let end = parse_timestamp(end)?;
        let step: i64 = step
            .trim()
            .parse()
            .map_err(|_| Error::InputParse(format!("step value '{}'", step)))?;
        let step = u32::try_from(step)
            .map_err(|_| Error::Configuration(format!("step must be positive, got {}", step)))?;
        let unit = unit.parse()?;
        Self::new(start, end, step, unit)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn step_duration(&self) -> Duration {
        self.unit.duration(self.step)
    }

    /// Hours between start and end.
    pub fn elapsed_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.
    }

    /// Time steps `start, start + step, ...` up to and including `end`.
    pub fn schedule(&self) -> Schedule {
        Schedule {
            next: Some(self.start),
            end: self.end,
            step: self.step_duration(),
        }
    }
}

/// Iterator over the time steps of a request.
#[derive(Debug, Clone)]
pub struct Schedule {
    next: Option<NaiveDateTime>,
    end: NaiveDateTime,
    step: Duration,
}

impl Iterator for Schedule {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<NaiveDateTime> {
        let current = self.next.filter(|t| *t <= self.end)?;
        self.next = current.checked_add_signed(self.step);
        Some(current)
    }
}

/// What an evaluator produced for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput<R> {
    pub records: Vec<R>,
    /// The step value that is averaged over the run.
    pub percentage: f64,
}

/// Computation performed at every time step.
pub trait StepEvaluator {
    type Record;

    /// Starts a new step. Called once per step, before any `resume`.
    fn begin_step(&mut self, time: NaiveDateTime, sun: &SunState);

    /// Continues the current step with at most `budget` units of work.
    fn resume(&mut self, budget: usize) -> Result<Progress<StepOutput<Self::Record>>>;
}

/// Final reduction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: usize,
    /// Arithmetic mean of the step percentages.
    pub average_percentage: f64,
    pub elapsed_hours: f64,
}

impl RunSummary {
    pub fn from_percentages(percentages: &[f64], elapsed_hours: f64) -> Self {
        let average_percentage = if percentages.is_empty() {
            0.
        } else {
            percentages.iter().sum::<f64>() / percentages.len() as f64
        };
        Self {
            steps: percentages.len(),
            average_percentage,
            elapsed_hours,
        }
    }

    /// `100 - average`, for runs whose steps report shadow percentages.
    pub fn sun_percentage(&self) -> f64 {
        100. - self.average_percentage
    }

    /// Energy estimate in kWh for a surface of `area` square meters,
    /// assuming 1 kW/m² while in sun.
    pub fn energy_output(&self, area: f64) -> f64 {
        area * self.sun_percentage() / 100. * self.elapsed_hours
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Stepping,
    Aggregating,
    Done,
}

/// Runs a [`StepEvaluator`] over a date/time range.
pub struct TimeSeriesDriver<P, E: StepEvaluator> {
    sun: P,
    evaluator: E,
    state: DriverState,
    request: Option<RunRequest>,
    schedule: Option<Schedule>,
    in_step: bool,
    percentages: Vec<f64>,
    records: Vec<E::Record>,
    summary: Option<RunSummary>,
}

impl<P, E> TimeSeriesDriver<P, E>
where
    P: SunDirectionProvider,
    E: StepEvaluator,
{
    pub fn new(sun: P, evaluator: E) -> Self {
        Self {
            sun,
            evaluator,
            state: DriverState::Idle,
            request: None,
            schedule: None,
            in_step: false,
            percentages: Vec::new(),
            records: Vec::new(),
            summary: None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Starts a run. Outputs of a previous run are cleared.
    pub fn start(&mut self, request: RunRequest) {
        info!(
            "Starting run {} .. {} every {:?}",
            request.start(),
            request.end(),
            request.step_duration()
        );
        self.clear();
        self.schedule = Some(request.schedule());
        self.request = Some(request);
        self.state = DriverState::Stepping;
    }

    /// Clears all outputs and returns to `Idle`.
    pub fn reset(&mut self) {
        self.clear();
        self.request = None;
        self.state = DriverState::Idle;
    }

    fn clear(&mut self) {
        self.schedule = None;
        self.in_step = false;
        self.percentages.clear();
        self.records.clear();
        self.summary = None;
    }

    /// Records of all finished steps, in step order.
    pub fn records(&self) -> &[E::Record] {
        &self.records
    }

    /// Percentages of all finished steps.
    pub fn percentages(&self) -> &[f64] {
        &self.percentages
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    fn aggregate(&mut self) -> RunSummary {
        self.state = DriverState::Aggregating;
        let elapsed = self
            .request
            .as_ref()
            .map(|r| r.elapsed_hours())
            .unwrap_or(0.);
        let summary = RunSummary::from_percentages(&self.percentages, elapsed);
        info!(
            "Run finished: {} steps, average {:.2}%",
            summary.steps, summary.average_percentage
        );
        self.summary = Some(summary);
        self.state = DriverState::Done;
        summary
    }
}

impl<P, E> ResumableTask for TimeSeriesDriver<P, E>
where
    P: SunDirectionProvider,
    E: StepEvaluator,
{
    type Output = RunSummary;

    /// Suspends after every finished step and inside steps whenever the
    /// evaluator suspends.
    fn resume(&mut self, budget: usize) -> Result<Progress<RunSummary>> {
        match self.state {
            DriverState::Idle => Err(Error::Configuration("no run started".to_string())),
            DriverState::Aggregating => Ok(Progress::Done(self.aggregate())),
            DriverState::Done => match self.summary {
                Some(summary) => Ok(Progress::Done(summary)),
                None => Ok(Progress::Done(self.aggregate())),
            },
            DriverState::Stepping => {
                if !self.in_step {
                    let next = self.schedule.as_mut().and_then(|s| s.next());
                    let Some(time) = next else {
                        return Ok(Progress::Done(self.aggregate()));
                    };
                    let sun = self.sun.sun_state(&time);
                    debug!("Step {} sun {}", time, sun.direction);
                    self.evaluator.begin_step(time, &sun);
                    self.in_step = true;
                }
                match self.evaluator.resume(budget)? {
                    Progress::Suspended => Ok(Progress::Suspended),
                    Progress::Done(out) => {
                        self.records.extend(out.records);
                        self.percentages.push(out.percentage);
                        self.in_step = false;
                        Ok(Progress::Suspended)
                    }
                }
            }
        }
    }
}
