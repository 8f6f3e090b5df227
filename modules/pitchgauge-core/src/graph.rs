//! Explicit task-graph executor for the evaluation DAG.
//!
//! Each node carries a dependency count; a node is dispatched as a tokio
//! task the moment its count reaches zero, so the join barrier in front of
//! aggregation is simply an indegree of four. Completed patches are merged
//! by this loop alone, a single writer, which keeps concurrent analyst
//! completions from ever racing on the shared state. The first failure
//! aborts the in-flight siblings and nothing downstream is dispatched.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::error::{PipelineError, StageError, StageFailure};
use crate::stage::{Stage, StageId};
use crate::state::{EvaluationState, StagePatch};

type StageOutcome = (StageId, Result<StagePatch, StageError>);

#[derive(Default)]
pub struct TaskGraph {
    stages: Vec<Arc<dyn Stage>>,
    edges: Vec<(StageId, StageId)>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&mut self, stage: Arc<dyn Stage>) {
        debug_assert!(
            !self.stages.iter().any(|s| s.id() == stage.id()),
            "stage registered twice"
        );
        self.stages.push(stage);
    }

    /// Declare that `to` must not start before `from` completes.
    pub fn add_edge(&mut self, from: StageId, to: StageId) {
        self.edges.push((from, to));
    }

    /// Drive the graph to completion, merging each stage's patch into
    /// `state` as it lands.
    pub async fn execute(&self, state: &mut EvaluationState) -> Result<(), PipelineError> {
        let stages_by_id: HashMap<StageId, Arc<dyn Stage>> = self
            .stages
            .iter()
            .map(|stage| (stage.id(), stage.clone()))
            .collect();

        let mut pending: HashMap<StageId, usize> =
            self.stages.iter().map(|stage| (stage.id(), 0)).collect();
        let mut successors: HashMap<StageId, Vec<StageId>> = HashMap::new();
        for (from, to) in &self.edges {
            if !pending.contains_key(from) {
                return Err(PipelineError::Aborted(format!(
                    "edge from unregistered stage `{from}`"
                )));
            }
            match pending.get_mut(to) {
                Some(count) => *count += 1,
                None => {
                    return Err(PipelineError::Aborted(format!(
                        "edge to unregistered stage `{to}`"
                    )))
                }
            }
            successors.entry(*from).or_default().push(*to);
        }

        let mut ready: VecDeque<Arc<dyn Stage>> = self
            .stages
            .iter()
            .filter(|stage| pending.get(&stage.id()).copied() == Some(0))
            .cloned()
            .collect();
        let mut in_flight: JoinSet<StageOutcome> = JoinSet::new();
        let mut completed = 0usize;

        loop {
            while let Some(stage) = ready.pop_front() {
                let snapshot = state.clone();
                debug!(stage = %stage.id(), "dispatching stage");
                in_flight.spawn(async move { (stage.id(), stage.run(snapshot).await) });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            match joined {
                Ok((id, Ok(patch))) => {
                    if let Err(merge) = state.apply(patch) {
                        abort_in_flight(&mut in_flight).await;
                        return Err(PipelineError::Merge { stage: id, merge });
                    }
                    completed += 1;
                    debug!(stage = %id, "stage complete");

                    for succ in successors.get(&id).into_iter().flatten() {
                        if let Some(count) = pending.get_mut(succ) {
                            *count -= 1;
                            if *count == 0 {
                                if let Some(stage) = stages_by_id.get(succ) {
                                    ready.push_back(stage.clone());
                                }
                            }
                        }
                    }
                }
                Ok((id, Err(source))) => {
                    error!(stage = %id, error = %source, "stage failed, aborting run");
                    abort_in_flight(&mut in_flight).await;
                    return Err(StageFailure { stage: id, source }.into());
                }
                Err(join_err) => {
                    abort_in_flight(&mut in_flight).await;
                    return Err(PipelineError::Aborted(format!(
                        "stage task died: {join_err}"
                    )));
                }
            }
        }

        if completed != self.stages.len() {
            return Err(PipelineError::Aborted(format!(
                "task graph stalled with {completed} of {} stages complete",
                self.stages.len()
            )));
        }
        Ok(())
    }
}

async fn abort_in_flight(set: &mut JoinSet<StageOutcome>) {
    set.abort_all();
    while set.join_next().await.is_some() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use model_client::ModelError;
    use pitchgauge_common::Metric;

    /// Writes one metric after an optional delay.
    struct ScoreStage {
        id: StageId,
        metric: Metric,
        delay_ms: u64,
        fail: bool,
    }

    #[async_trait]
    impl Stage for ScoreStage {
        fn id(&self) -> StageId {
            self.id
        }

        async fn run(&self, _state: EvaluationState) -> Result<StagePatch, StageError> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail {
                return Err(StageError::Model(ModelError::MissingOutput));
            }
            Ok(StagePatch::MetricContribution {
                scores: BTreeMap::from([(self.metric, 5.0)]),
                rationales: BTreeMap::from([(self.metric, "scored".into())]),
            })
        }
    }

    /// Join node asserting that all expected metrics merged before it ran.
    struct BarrierStage {
        expects: Vec<Metric>,
        ran: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Stage for BarrierStage {
        fn id(&self) -> StageId {
            StageId::Aggregate
        }

        async fn run(&self, state: EvaluationState) -> Result<StagePatch, StageError> {
            self.ran.store(true, Ordering::SeqCst);
            for metric in &self.expects {
                if !state.metric_scores.contains_key(metric) {
                    return Err(StageError::MissingInput("metric"));
                }
            }
            Ok(StagePatch::MetricContribution {
                scores: BTreeMap::new(),
                rationales: BTreeMap::new(),
            })
        }
    }

    fn fan_out_graph(delays: [u64; 3], fail_market: bool, ran: Arc<AtomicBool>) -> TaskGraph {
        let mut graph = TaskGraph::new();
        graph.add_stage(Arc::new(ScoreStage {
            id: StageId::ProductAnalyst,
            metric: Metric::Originality,
            delay_ms: delays[0],
            fail: false,
        }));
        graph.add_stage(Arc::new(ScoreStage {
            id: StageId::MarketAnalyst,
            metric: Metric::MarketSize,
            delay_ms: delays[1],
            fail: fail_market,
        }));
        graph.add_stage(Arc::new(ScoreStage {
            id: StageId::MoatAnalyst,
            metric: Metric::Defensibility,
            delay_ms: delays[2],
            fail: false,
        }));
        graph.add_stage(Arc::new(BarrierStage {
            expects: vec![Metric::Originality, Metric::MarketSize, Metric::Defensibility],
            ran,
        }));
        for id in [
            StageId::ProductAnalyst,
            StageId::MarketAnalyst,
            StageId::MoatAnalyst,
        ] {
            graph.add_edge(id, StageId::Aggregate);
        }
        graph
    }

    #[tokio::test]
    async fn barrier_waits_for_all_predecessors_regardless_of_order() {
        for delays in [[0, 20, 40], [40, 20, 0], [20, 0, 40]] {
            let ran = Arc::new(AtomicBool::new(false));
            let graph = fan_out_graph(delays, false, ran.clone());
            let mut state = EvaluationState::new("idea");
            graph.execute(&mut state).await.unwrap();

            assert!(ran.load(Ordering::SeqCst));
            assert_eq!(state.metric_scores.len(), 3);
        }
    }

    #[tokio::test]
    async fn failure_short_circuits_and_barrier_never_runs() {
        let ran = Arc::new(AtomicBool::new(false));
        let graph = fan_out_graph([50, 0, 50], true, ran.clone());
        let mut state = EvaluationState::new("idea");

        let err = graph.execute(&mut state).await.unwrap_err();
        assert_eq!(err.stage(), Some(StageId::MarketAnalyst));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cyclic_graph_is_reported_as_stalled() {
        let mut graph = TaskGraph::new();
        graph.add_stage(Arc::new(ScoreStage {
            id: StageId::ProductAnalyst,
            metric: Metric::Originality,
            delay_ms: 0,
            fail: false,
        }));
        graph.add_stage(Arc::new(ScoreStage {
            id: StageId::MarketAnalyst,
            metric: Metric::MarketSize,
            delay_ms: 0,
            fail: false,
        }));
        graph.add_edge(StageId::ProductAnalyst, StageId::MarketAnalyst);
        graph.add_edge(StageId::MarketAnalyst, StageId::ProductAnalyst);

        let mut state = EvaluationState::new("idea");
        let err = graph.execute(&mut state).await.unwrap_err();
        assert!(matches!(err, PipelineError::Aborted(_)));
    }
}
