//! Execution simulator
//!
//! Producer threads submit execution plans; one dedicated worker thread per
//! simulator dequeues them and executes their orders strictly in sequence.
//!
//! ```text
//!  submit() ──► ┌────────────┐  work_ready   ┌────────┐
//!  submit() ──► │ plan queue │ ────────────► │ worker │ ──► MarketModel
//!               └────────────┘               └───┬────┘
//!                                                │ per order
//!                     history ◄──────────────────┤
//!                     PnlTracker ◄───────────────┤
//!                     callback ◄─────────────────┘
//! ```
//!
//! The plan queue and the execution history share one mutex, so "queue
//! drained and nothing in flight" is observed atomically by
//! `wait_until_idle`. The `MarketModel` (and with it the RNG) is moved into
//! the worker on `start()` and handed back through the join handle on
//! `stop()`; while the worker runs no other thread can reach it.

use crate::error::SimulationError;
use crate::execution::SimulatedExecution;
use crate::metrics::SimulationMetrics;
use crate::models::MarketModel;
use crate::params::SimulationParameters;
use crate::tracker::{PnlLedger, PnlSnapshot, PnlTracker};
use crate::validation::{self, ValidationResult};
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use types::ids::PlanId;
use types::market::{MarketDataPoint, MarketKey};
use types::opportunity::ArbitrageOpportunity;
use types::order::ExecutionOrder;
use types::plan::{ExecutionPlan, PlanStatus};

/// Upper bound on a single worker wait before re-checking the running flag.
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Invoked on the worker thread after every simulated order.
pub type ExecutionCallback = Arc<dyn Fn(&SimulatedExecution) + Send + Sync>;

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct Ledger {
    queue: VecDeque<ExecutionPlan>,
    history: Vec<SimulatedExecution>,
    /// Completed plans in completion order
    completed: Vec<ExecutionPlan>,
    in_flight: Option<ExecutionPlan>,
}

impl Ledger {
    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_none()
    }
}

/// State shared between the simulator handle and its worker.
struct Shared {
    ledger: Mutex<Ledger>,
    work_ready: Condvar,
    idle: Condvar,
    running: AtomicBool,
    market: Mutex<HashMap<MarketKey, MarketDataPoint>>,
    tracker: Mutex<Box<dyn PnlTracker>>,
    callback: Mutex<Option<ExecutionCallback>>,
    staged_params: Mutex<Option<SimulationParameters>>,
}

impl Shared {
    fn process_plan(&self, model: &mut MarketModel, mut plan: ExecutionPlan) {
        if let Err(err) = plan.begin(Utc::now()) {
            warn!(plan_id = %plan.plan_id, error = %err, "Skipping plan in unexpected state");
            self.finish(plan);
            return;
        }
        if let Some(in_flight) = lock(&self.ledger).in_flight.as_mut() {
            *in_flight = plan.clone();
        }

        info!(
            plan_id = %plan.plan_id,
            orders = plan.orders.len(),
            mode = %model.params().mode,
            "Executing plan"
        );

        let pacing = model.params().order_pacing();
        for order in &plan.orders {
            let execution = self.execute_order(model, plan.plan_id, order);

            let callback = lock(&self.callback).clone();
            if let Some(callback) = callback {
                callback(&execution);
            }

            if !pacing.is_zero() {
                thread::sleep(pacing);
            }
        }

        if let Err(err) = plan.complete(Utc::now()) {
            warn!(plan_id = %plan.plan_id, error = %err, "Plan completion out of order");
        }
        self.finish(plan);
    }

    /// Simulate one order, append it to the history, then feed the tracker.
    fn execute_order(
        &self,
        model: &mut MarketModel,
        plan_id: PlanId,
        order: &ExecutionOrder,
    ) -> SimulatedExecution {
        let market = lock(&self.market)
            .get(&MarketKey::new(&order.symbol, &order.exchange))
            .cloned();
        let mut execution = model.simulate(order, market.as_ref());
        execution.plan_id = Some(plan_id);

        lock(&self.ledger).history.push(execution.clone());
        {
            let mut tracker = lock(&self.tracker);
            if let Some(point) = &market {
                let mid = point.mid();
                if mid > 0.0 {
                    tracker.update_market_price(&point.symbol, &point.exchange, mid);
                }
            }
            if execution.was_executed {
                tracker.record_trade(order, execution.executed_price, execution.executed_quantity);
            }
        }

        debug!(
            symbol = %order.symbol,
            exchange = %order.exchange,
            side = ?order.side,
            executed = execution.was_executed,
            price = execution.executed_price,
            quantity = execution.executed_quantity,
            slippage = execution.slippage,
            latency_ms = execution.latency_ms(),
            "Order simulated"
        );
        if let Some(reason) = execution.failure_reasons.first() {
            debug!(order_id = %order.order_id, reason = %reason, "Order not executed");
        }
        execution
    }

    fn finish(&self, plan: ExecutionPlan) {
        let mut ledger = lock(&self.ledger);
        ledger.in_flight = None;
        ledger.completed.push(plan);
        if ledger.queue.is_empty() {
            self.idle.notify_all();
        }
    }
}

fn worker_loop(shared: Arc<Shared>, mut model: MarketModel) -> MarketModel {
    info!(mode = %model.params().mode, seed = model.params().random_seed, "Simulation worker started");

    loop {
        let plan = {
            let ledger = lock(&shared.ledger);
            let (mut ledger, _) = shared
                .work_ready
                .wait_timeout_while(ledger, WORKER_POLL_INTERVAL, |l| {
                    l.queue.is_empty() && shared.running.load(Ordering::Acquire)
                })
                .unwrap_or_else(PoisonError::into_inner);

            if !shared.running.load(Ordering::Acquire) {
                break;
            }
            match ledger.queue.pop_front() {
                Some(plan) => {
                    ledger.in_flight = Some(plan.clone());
                    plan
                }
                None => continue,
            }
        };

        if let Some(params) = lock(&shared.staged_params).take() {
            info!(mode = %params.mode, "Worker adopting updated parameters");
            model = MarketModel::new(params);
        }
        shared.process_plan(&mut model, plan);
    }

    info!("Simulation worker stopped");
    model
}

/// Single-worker execution simulator.
pub struct ExecutionSimulator {
    shared: Arc<Shared>,
    params: Mutex<SimulationParameters>,
    /// The model while no worker owns it
    parked_model: Mutex<Option<MarketModel>>,
    /// Also serializes start/stop
    worker: Mutex<Option<JoinHandle<MarketModel>>>,
}

impl ExecutionSimulator {
    /// Create a simulator with its own default `PnlLedger`.
    pub fn new(params: SimulationParameters) -> Result<Self, SimulationError> {
        Self::with_tracker(params, Box::new(PnlLedger::default()))
    }

    /// Create a simulator that exclusively owns `tracker`.
    ///
    /// Fails with `InvalidParameters` when `params` do not validate.
    pub fn with_tracker(
        params: SimulationParameters,
        tracker: Box<dyn PnlTracker>,
    ) -> Result<Self, SimulationError> {
        params.validate()?;
        info!(mode = %params.mode, deterministic = params.deterministic, "ExecutionSimulator initialized");
        Ok(Self {
            shared: Arc::new(Shared {
                ledger: Mutex::new(Ledger::default()),
                work_ready: Condvar::new(),
                idle: Condvar::new(),
                running: AtomicBool::new(false),
                market: Mutex::new(HashMap::new()),
                tracker: Mutex::new(tracker),
                callback: Mutex::new(None),
                staged_params: Mutex::new(None),
            }),
            parked_model: Mutex::new(Some(MarketModel::new(params.clone()))),
            params: Mutex::new(params),
            worker: Mutex::new(None),
        })
    }

    /// Queue a plan for the worker.
    ///
    /// `None`, an empty plan, or a plan that already left `Pending` is
    /// logged and dropped. Returns whether the plan was queued. Never
    /// starts the worker.
    pub fn submit(&self, plan: Option<ExecutionPlan>) -> bool {
        let plan = match plan {
            Some(plan) if !plan.is_empty() && plan.status == PlanStatus::Pending => plan,
            other => {
                warn!(
                    error = %SimulationError::NullPlanSubmission,
                    plan_id = ?other.as_ref().map(|p| p.plan_id),
                    "Plan submission rejected"
                );
                return false;
            }
        };

        debug!(plan_id = %plan.plan_id, orders = plan.orders.len(), "Plan queued");
        let mut ledger = lock(&self.shared.ledger);
        ledger.queue.push_back(plan);
        self.shared.work_ready.notify_one();
        true
    }

    /// Spawn the worker. Idempotent.
    pub fn start(&self) {
        let mut worker = lock(&self.worker);
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Simulator already running");
            return;
        }

        let model = lock(&self.parked_model)
            .take()
            .unwrap_or_else(|| MarketModel::new(self.parameters()));
        let shared = Arc::clone(&self.shared);

        match thread::Builder::new()
            .name("execution-sim-worker".to_string())
            .spawn(move || worker_loop(shared, model))
        {
            Ok(handle) => *worker = Some(handle),
            Err(err) => {
                self.shared.running.store(false, Ordering::Release);
                error!(error = %err, "Failed to spawn simulation worker");
            }
        }
    }

    /// Stop the worker and wait for it to exit. Idempotent.
    ///
    /// An order in progress finishes first; plans still queued stay queued.
    pub fn stop(&self) {
        let mut worker = lock(&self.worker);
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }
        {
            let _ledger = lock(&self.shared.ledger);
            self.shared.work_ready.notify_all();
        }

        let Some(handle) = worker.take() else {
            return;
        };
        let model = match handle.join() {
            Ok(model) => Some(model),
            Err(_) => {
                error!("Simulation worker panicked; market model will be rebuilt");
                None
            }
        };

        let staged = lock(&self.shared.staged_params).take();
        *lock(&self.parked_model) = match staged {
            Some(params) => Some(MarketModel::new(params)),
            None => model,
        };
        info!("Simulator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Block until the queue is drained and no plan is in flight.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let ledger = lock(&self.shared.ledger);
        let (ledger, _) = self
            .shared
            .idle
            .wait_timeout_while(ledger, timeout, |l| !l.is_idle())
            .unwrap_or_else(PoisonError::into_inner);
        ledger.is_idle()
    }

    /// Simulate one order synchronously, outside the plan pipeline.
    ///
    /// Nothing is recorded in the history or the tracker. Fails with
    /// `WorkerActive` while the worker owns the market model.
    pub fn simulate_order_execution(
        &self,
        order: &ExecutionOrder,
        market_data: &MarketDataPoint,
    ) -> Result<SimulatedExecution, SimulationError> {
        let mut parked = lock(&self.parked_model);
        let model = parked.as_mut().ok_or(SimulationError::WorkerActive)?;
        Ok(model.simulate(order, Some(market_data)))
    }

    /// Replace the market snapshot feed.
    pub fn set_market_data_feed(&self, data: Vec<MarketDataPoint>) {
        let feed: HashMap<MarketKey, MarketDataPoint> =
            data.into_iter().map(|point| (point.key(), point)).collect();
        debug!(markets = feed.len(), "Market data feed updated");
        *lock(&self.shared.market) = feed;
    }

    pub fn set_execution_callback<F>(&self, callback: F)
    where
        F: Fn(&SimulatedExecution) + Send + Sync + 'static,
    {
        *lock(&self.shared.callback) = Some(Arc::new(callback));
    }

    /// Swap in new parameters.
    ///
    /// Applied immediately while idle (the model is reseeded); while
    /// running, the worker adopts them before its next plan.
    pub fn update_simulation_parameters(&self, params: SimulationParameters) -> Result<(), SimulationError> {
        params.validate()?;
        *lock(&self.params) = params.clone();

        let mut parked = lock(&self.parked_model);
        if parked.is_some() {
            *parked = Some(MarketModel::new(params));
        } else {
            *lock(&self.shared.staged_params) = Some(params);
        }
        Ok(())
    }

    pub fn parameters(&self) -> SimulationParameters {
        lock(&self.params).clone()
    }

    pub fn current_metrics(&self) -> SimulationMetrics {
        let ledger = lock(&self.shared.ledger);
        let pnl = lock(&self.shared.tracker).current_snapshot();
        SimulationMetrics::from_history(&ledger.history, &pnl)
    }

    pub fn execution_history(&self) -> Vec<SimulatedExecution> {
        lock(&self.shared.ledger).history.clone()
    }

    pub fn pnl_snapshot(&self) -> PnlSnapshot {
        lock(&self.shared.tracker).current_snapshot()
    }

    pub fn validate_trading_logic(
        &self,
        predicted: &[ArbitrageOpportunity],
        actual: &[SimulatedExecution],
    ) -> ValidationResult {
        let tracker = lock(&self.shared.tracker);
        validation::validate_trading_logic(predicted, actual, &**tracker)
    }

    /// Look up a plan by id, wherever it is in its lifecycle.
    pub fn plan(&self, plan_id: PlanId) -> Option<ExecutionPlan> {
        let ledger = lock(&self.shared.ledger);
        ledger
            .completed
            .iter()
            .chain(ledger.in_flight.iter())
            .chain(ledger.queue.iter())
            .find(|p| p.plan_id == plan_id)
            .cloned()
    }

    pub fn completed_plans(&self) -> Vec<ExecutionPlan> {
        lock(&self.shared.ledger).completed.clone()
    }

    pub fn pending_plans(&self) -> usize {
        lock(&self.shared.ledger).queue.len()
    }
}

impl Drop for ExecutionSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::order::Side;

    fn quiet_params() -> SimulationParameters {
        SimulationParameters {
            deterministic: true,
            order_pacing_ms: 0,
            ..Default::default()
        }
    }

    fn market() -> MarketDataPoint {
        MarketDataPoint::new("BTC-USDT", "binance", 49_990.0, 50_010.0, 50_000.0, 1_000.0)
    }

    fn plan(n: usize) -> ExecutionPlan {
        let orders = (0..n)
            .map(|_| ExecutionOrder::new("BTC-USDT", "binance", Side::BUY, 0.01, 50_000.0))
            .collect();
        ExecutionPlan::new(None, orders)
    }

    #[test]
    fn test_rejects_null_and_empty_plans() {
        let sim = ExecutionSimulator::new(quiet_params()).unwrap();
        assert!(!sim.submit(None));
        assert!(!sim.submit(Some(plan(0))));
        assert_eq!(sim.pending_plans(), 0);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_rejects_already_started_plan() {
        let sim = ExecutionSimulator::new(quiet_params()).unwrap();
        let mut p = plan(1);
        p.begin(Utc::now()).unwrap();
        assert!(!sim.submit(Some(p)));
    }

    #[test]
    fn test_submit_does_not_start_worker() {
        let sim = ExecutionSimulator::new(quiet_params()).unwrap();
        assert!(sim.submit(Some(plan(1))));
        assert_eq!(sim.pending_plans(), 1);
        assert!(!sim.is_running());
        assert!(!sim.wait_until_idle(Duration::from_millis(20)));
    }

    #[test]
    fn test_start_stop_idempotent() {
        let sim = ExecutionSimulator::new(quiet_params()).unwrap();
        sim.start();
        sim.start();
        assert!(sim.is_running());
        sim.stop();
        sim.stop();
        assert!(!sim.is_running());
        sim.start();
        assert!(sim.is_running());
    }

    #[test]
    fn test_model_unavailable_while_running() {
        let sim = ExecutionSimulator::new(quiet_params()).unwrap();
        let order = ExecutionOrder::new("BTC-USDT", "binance", Side::BUY, 0.01, 50_000.0);
        assert!(sim.simulate_order_execution(&order, &market()).is_ok());

        sim.start();
        assert!(matches!(
            sim.simulate_order_execution(&order, &market()),
            Err(SimulationError::WorkerActive)
        ));
        sim.stop();
        assert!(sim.simulate_order_execution(&order, &market()).is_ok());
    }

    #[test]
    fn test_direct_simulation_not_recorded() {
        let sim = ExecutionSimulator::new(quiet_params()).unwrap();
        let order = ExecutionOrder::new("BTC-USDT", "binance", Side::BUY, 0.01, 50_000.0);
        sim.simulate_order_execution(&order, &market()).unwrap();
        assert!(sim.execution_history().is_empty());
        assert_eq!(sim.pnl_snapshot().trade_count, 0);
    }

    #[test]
    fn test_plan_runs_to_completion() {
        let sim = ExecutionSimulator::new(quiet_params()).unwrap();
        sim.set_market_data_feed(vec![market()]);
        let p = plan(3);
        let id = p.plan_id;
        sim.submit(Some(p));
        sim.start();
        assert!(sim.wait_until_idle(Duration::from_secs(5)));
        sim.stop();

        let done = sim.plan(id).unwrap();
        assert_eq!(done.status, PlanStatus::Completed);
        assert!(done.completion_time.unwrap() >= done.actual_start_time.unwrap());
        let history = sim.execution_history();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|e| e.plan_id == Some(id)));
    }

    #[test]
    fn test_missing_market_does_not_abort_plan() {
        let sim = ExecutionSimulator::new(quiet_params()).unwrap();
        sim.set_market_data_feed(vec![market()]);
        let mut p = plan(1);
        p.orders.insert(0, ExecutionOrder::new("DOGE-USDT", "nowhere", Side::SELL, 1.0, 0.1));
        sim.submit(Some(p));
        sim.start();
        assert!(sim.wait_until_idle(Duration::from_secs(5)));
        sim.stop();

        let history = sim.execution_history();
        assert_eq!(history.len(), 2);
        assert!(!history[0].was_executed);
        assert_eq!(sim.current_metrics().failed_executions, history.iter().filter(|e| !e.was_executed).count());
    }

    #[test]
    fn test_new_rejects_invalid_parameters() {
        let params = SimulationParameters {
            base_latency_ms: f64::INFINITY,
            ..quiet_params()
        };
        assert!(matches!(
            ExecutionSimulator::new(params),
            Err(SimulationError::InvalidParameters { name: "base_latency_ms", .. })
        ));
    }

    #[test]
    fn test_callback_sees_recorded_execution() {
        let sim = Arc::new(ExecutionSimulator::new(quiet_params()).unwrap());
        sim.set_market_data_feed(vec![market()]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = Arc::downgrade(&sim);
        let sink = Arc::clone(&seen);
        sim.set_execution_callback(move |_| {
            if let Some(sim) = handle.upgrade() {
                sink.lock().unwrap().push(sim.execution_history().len());
            }
        });

        sim.submit(Some(plan(2)));
        sim.start();
        assert!(sim.wait_until_idle(Duration::from_secs(5)));
        sim.stop();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_oversized_fill_does_not_stop_worker() {
        let params = SimulationParameters {
            execution_success_rate: 1.0,
            partial_fill_probability: 0.0,
            ..quiet_params()
        };
        let sim = ExecutionSimulator::new(params).unwrap();
        let huge = MarketDataPoint::new("BTC-USDT", "binance", 1e14, 1e14, 1e14, 1e16);
        sim.set_market_data_feed(vec![huge]);
        let orders = vec![ExecutionOrder::new("BTC-USDT", "binance", Side::BUY, 1e15, 1e14)];
        let p = ExecutionPlan::new(None, orders);
        let id = p.plan_id;
        sim.submit(Some(p));
        sim.start();
        assert!(sim.wait_until_idle(Duration::from_secs(5)));
        assert!(sim.is_running());
        sim.stop();

        assert_eq!(sim.execution_history().len(), 1);
        assert_eq!(sim.plan(id).unwrap().status, PlanStatus::Completed);
        assert_eq!(sim.pnl_snapshot().trade_count, 0);
    }

    #[test]
    fn test_update_parameters_validates() {
        let sim = ExecutionSimulator::new(quiet_params()).unwrap();
        let bad = SimulationParameters {
            partial_fill_probability: 2.0,
            ..Default::default()
        };
        assert!(sim.update_simulation_parameters(bad).is_err());

        let good = SimulationParameters {
            random_seed: 9,
            ..quiet_params()
        };
        sim.update_simulation_parameters(good).unwrap();
        assert_eq!(sim.parameters().random_seed, 9);
    }
}
