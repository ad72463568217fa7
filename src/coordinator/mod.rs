//! Event scheduler
//!
//! Multiplexes many concurrently "running" playback instances into one
//! globally time-ordered trace. All concurrency is simulated: a single loop
//! owns the object pool, the active set and the sampler.
//!
//! # Tick
//!
//! 1. Make sure an admission candidate exists (sample one if needed).
//! 2. If the candidate fits the object pool, admit it at the current
//!    simulated time, write its open batch and schedule its first event.
//! 3. Pop the earliest active instance, write its next event, and reschedule
//!    it. An instance with no events left is closed in that same batch.
//!
//! Ticks repeat until the requested number of drain steps has been written.
//! Whatever is still active at that point is closed, one close batch per
//! instance; these are the only standalone close batches in a trace.
//!
//! # Simulated time
//!
//! The current time is the earliest pending event in the active set. When the
//! active set is empty it is the time of the last drained event (0 at start),
//! so released batch times never go backwards.

pub mod active_set;
pub mod admission;

use crate::config::{validator, DeferralPolicy, GeneratorConfig};
use crate::distribution::uniform::XoshiroSource;
use crate::distribution::weighted::WeightedSampler;
use crate::distribution::UnitSource;
use crate::model::ModelRegistry;
use crate::output::iolog::{TraceDestination, TraceWriter};
use crate::output::{Batch, BatchKind, TraceSink};
use crate::stats::GenerationStats;
use crate::target::pool::ObjectPool;
use crate::worker::Playback;
use crate::Result;
use active_set::ActiveSet;
use admission::{Admission, AdmissionOutcome};
use tracing::{debug, info, trace, warn};

/// What a single tick achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One event was drained and written
    Drained,
    /// Nothing was active to drain, but admission can still make progress
    Idle,
    /// Nothing is active and the pool can never admit another model
    Starved,
}

/// Time-ordered trace generator
pub struct Scheduler {
    sampler: WeightedSampler,
    pool: ObjectPool,
    active: ActiveSet,
    admission: Admission,
    source: Box<dyn UnitSource>,
    /// Smallest object footprint among all models
    min_object_count: usize,
    /// Time of the last released event
    clock: u64,
    stats: GenerationStats,
}

impl Scheduler {
    /// Create a scheduler over a built sampler and an empty pool
    ///
    /// Fails when no model could ever fit the pool.
    pub fn new(
        sampler: WeightedSampler,
        pool: ObjectPool,
        policy: DeferralPolicy,
        source: Box<dyn UnitSource>,
    ) -> Result<Self> {
        let min_object_count = sampler
            .models()
            .iter()
            .map(|m| m.object_count() as usize)
            .min()
            .unwrap_or(0);

        if min_object_count > pool.max_objects() {
            anyhow::bail!(
                "smallest model needs {} objects but the pool holds at most {}",
                min_object_count,
                pool.max_objects()
            );
        }

        Ok(Self {
            sampler,
            pool,
            active: ActiveSet::new(),
            admission: Admission::new(policy),
            source,
            min_object_count,
            clock: 0,
            stats: GenerationStats::new(),
        })
    }

    /// Current simulated time
    pub fn now(&self) -> u64 {
        self.active.peek_time().unwrap_or(self.clock)
    }

    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    /// Run one admission + drain step
    pub fn tick(&mut self, sink: &mut dyn TraceSink) -> Result<TickOutcome> {
        let outcome = self
            .admission
            .step(&self.sampler, self.source.as_mut(), &self.pool);

        let deferred = match outcome {
            AdmissionOutcome::Admit(model) => {
                let now = self.now();
                let mut playback = Playback::admit(model, &mut self.pool, now)?;
                self.stats.record_admission(playback.model().name());

                let mut commands = playback.open()?;
                self.schedule(playback, &mut commands)?;
                sink.write_batch(&Batch {
                    kind: BatchKind::Open,
                    time: now,
                    commands: &commands,
                })?;
                false
            }
            AdmissionOutcome::Deferred(model) => {
                trace!(
                    "Deferred '{}' ({} objects, {} free)",
                    model.name(),
                    model.object_count(),
                    self.pool.remaining()
                );
                self.stats.deferrals += 1;
                true
            }
        };

        let Some((time, mut playback)) = self.active.pop() else {
            if !self.pool.has_headroom(self.min_object_count) {
                return Ok(TickOutcome::Starved);
            }
            if deferred {
                // The pool never shrinks: a retained candidate that does not fit
                // now never will, and nothing is left to drain meanwhile
                self.admission.discard();
            }
            return Ok(TickOutcome::Idle);
        };

        let mut commands = playback.emit_next(time)?;
        self.schedule(playback, &mut commands)?;
        sink.write_batch(&Batch {
            kind: BatchKind::Drain,
            time,
            commands: &commands,
        })?;
        self.clock = time;
        self.stats.drains += 1;
        self.stats.final_time = time;

        Ok(TickOutcome::Drained)
    }

    /// Reinsert an instance under its next event time, or close it
    ///
    /// An exhausted instance's close commands are appended to `commands`, so
    /// they leave in the same batch as the open or event that finished it.
    fn schedule(&mut self, mut playback: Playback, commands: &mut String) -> Result<()> {
        match playback.next_event_time() {
            Some(next) => {
                self.active.push(next, playback);
                self.stats.observe_active(self.active.len());
            }
            None => {
                commands.push_str(&playback.close()?);
                self.stats.natural_closes += 1;
            }
        }
        Ok(())
    }

    /// Close every instance still active
    pub fn shutdown(&mut self, sink: &mut dyn TraceSink) -> Result<()> {
        let time = self.clock;
        let remaining: Vec<Playback> = self.active.drain().collect();
        for mut playback in remaining {
            let commands = playback.close()?;
            sink.write_batch(&Batch {
                kind: BatchKind::Close,
                time,
                commands: &commands,
            })?;
            self.stats.shutdown_closes += 1;
        }
        Ok(())
    }

    /// Generate a full trace: header, `operations` drain steps, shutdown
    ///
    /// `operations == 0` runs until the pool is starved, which for a
    /// non-empty model set with non-empty op lists only happens once every
    /// admissible instance has finished.
    pub fn run(mut self, operations: u64, sink: &mut dyn TraceSink) -> Result<GenerationStats> {
        sink.write_header()?;

        let unbounded = operations == 0;
        while unbounded || self.stats.drains < operations {
            if self.tick(sink)? == TickOutcome::Starved {
                warn!(
                    "Object pool exhausted ({} of {} objects used); stopping after {} operations",
                    self.pool.names_count(),
                    self.pool.max_objects(),
                    self.stats.drains
                );
                self.stats.pool_starved = true;
                break;
            }
        }

        debug!("Closing {} active instances", self.active.len());
        self.shutdown(sink)?;
        self.stats.objects_used = self.pool.names_count();
        Ok(self.stats)
    }
}

/// Generate a trace for `config` from the loaded models
///
/// Writes to the configured destination, which is only made visible once the
/// whole trace has been generated.
pub fn generate_trace(config: &GeneratorConfig, registry: &ModelRegistry) -> Result<GenerationStats> {
    validator::validate_models(config, registry)?;

    let sampler = WeightedSampler::new(registry.models())?;
    let source = match config.seed {
        Some(seed) => XoshiroSource::with_seed(seed),
        None => XoshiroSource::new(),
    };
    info!("Using seed {}", source.seed());

    let pool = ObjectPool::new(config.prefix.clone(), config.max_objects);
    let scheduler = Scheduler::new(sampler, pool, config.deferral, Box::new(source))?;

    let destination = TraceDestination::open(config.output.as_deref())?;
    let mut writer = TraceWriter::new(destination);
    let stats = scheduler.run(config.operations, &mut writer)?;
    writer.finish()?.commit()?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::scripted::ScriptedSource;
    use crate::model::{ModelOp, OpAction, WorkloadModel};
    use crate::output::IOLOG_HEADER;
    use std::collections::HashSet;
    use std::fs;
    use std::io::Write;
    use std::sync::Arc;

    /// Sink recording every batch with its kind and time
    #[derive(Default)]
    struct RecordingSink {
        header: bool,
        batches: Vec<(BatchKind, u64, String)>,
    }

    impl TraceSink for RecordingSink {
        fn write_header(&mut self) -> Result<()> {
            assert!(!self.header, "header written twice");
            assert!(self.batches.is_empty(), "header written after batches");
            self.header = true;
            Ok(())
        }

        fn write_batch(&mut self, batch: &Batch<'_>) -> Result<()> {
            self.batches
                .push((batch.kind, batch.time, batch.commands.to_string()));
            Ok(())
        }
    }

    impl RecordingSink {
        fn count(&self, kind: BatchKind) -> usize {
            self.batches.iter().filter(|(k, _, _)| *k == kind).count()
        }
    }

    /// Model with `ops` reads spaced `step` microseconds apart
    fn model(name: &str, length: u32, objects: u32, ops: u64, step: u64) -> WorkloadModel {
        let ops = (0..ops)
            .map(|i| ModelOp::new(i * step, OpAction::Read, (i % objects as u64) as u32, i * 4096, 4096))
            .collect();
        WorkloadModel::new(name, length, objects, ops).unwrap()
    }

    fn scheduler(models: Vec<WorkloadModel>, max_objects: usize, seed: u64) -> Scheduler {
        let registry = ModelRegistry::new(models);
        let sampler = WeightedSampler::new(registry.models()).unwrap();
        Scheduler::new(
            sampler,
            ObjectPool::new("x.", max_objects),
            DeferralPolicy::Resample,
            Box::new(XoshiroSource::with_seed(seed)),
        )
        .unwrap()
    }

    fn referenced_objects(sink: &RecordingSink) -> HashSet<String> {
        sink.batches
            .iter()
            .flat_map(|(_, _, cmds)| cmds.lines())
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }

    /// Object names of every `<name> <action>` command line with that action
    fn command_lines(sink: &RecordingSink, action: &str) -> Vec<String> {
        sink.batches
            .iter()
            .flat_map(|(_, _, cmds)| cmds.lines())
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let name = fields.next()?;
                (fields.next() == Some(action) && fields.next().is_none()).then(|| name.to_string())
            })
            .collect()
    }

    #[test]
    fn test_single_model_single_operation() {
        let sched = scheduler(vec![model("m", 10, 2, 5, 2)], 10, 1);
        let mut sink = RecordingSink::default();
        let stats = sched.run(1, &mut sink).unwrap();

        assert!(sink.header);
        assert_eq!(sink.count(BatchKind::Open), 1);
        assert_eq!(sink.count(BatchKind::Drain), 1);
        assert_eq!(sink.batches[0].0, BatchKind::Open);
        assert_eq!(sink.batches[1].0, BatchKind::Drain);
        assert!(referenced_objects(&sink).len() <= 2);
        assert_eq!(stats.drains, 1);
        assert_eq!(stats.objects_used, 2);
    }

    #[test]
    fn test_exact_drain_count() {
        for operations in [1, 7, 250] {
            let sched = scheduler(vec![model("a", 10, 1, 20, 3), model("b", 40, 2, 50, 1)], 1000, 9);
            let mut sink = RecordingSink::default();
            let stats = sched.run(operations, &mut sink).unwrap();

            assert_eq!(sink.count(BatchKind::Drain) as u64, operations);
            assert_eq!(stats.drains, operations);
            assert!(!stats.pool_starved);
        }
    }

    #[test]
    fn test_drain_times_non_decreasing() {
        let sched = scheduler(
            vec![model("a", 10, 1, 4, 5), model("b", 30, 3, 12, 7), model("c", 5, 2, 2, 0)],
            60,
            77,
        );
        let mut sink = RecordingSink::default();
        sched.run(2000, &mut sink).unwrap();

        let times: Vec<u64> = sink.batches.iter().map(|(_, t, _)| *t).collect();
        for pair in times.windows(2) {
            assert!(pair[0] <= pair[1], "time went backwards: {:?}", pair);
        }
    }

    #[test]
    fn test_now_holds_last_drain_time_when_idle() {
        let mut sched = scheduler(vec![model("m", 10, 1, 2, 5)], 1, 1);
        let mut sink = RecordingSink::default();

        assert_eq!(sched.now(), 0);
        assert_eq!(sched.tick(&mut sink).unwrap(), TickOutcome::Drained);
        assert_eq!(sched.tick(&mut sink).unwrap(), TickOutcome::Drained);
        assert_eq!(sched.active_len(), 0);
        assert_eq!(sched.now(), 5);
        assert_eq!(sched.tick(&mut sink).unwrap(), TickOutcome::Starved);
    }

    #[test]
    fn test_pool_never_exceeds_cap() {
        let mut sched = scheduler(vec![model("a", 10, 3, 6, 1), model("b", 20, 4, 10, 2)], 25, 5);
        let mut sink = RecordingSink::default();

        for _ in 0..500 {
            sched.tick(&mut sink).unwrap();
            assert!(sched.pool().names_count() <= 25);
        }
        assert!(referenced_objects(&sink).len() <= 25);
    }

    #[test]
    fn test_shutdown_closes_follow_last_drain() {
        let sched = scheduler(vec![model("long", 10, 1, 1000, 1)], 100, 3);
        let mut sink = RecordingSink::default();
        let stats = sched.run(50, &mut sink).unwrap();

        let still_active = stats.shutdown_closes as usize;
        assert!(still_active > 0);
        assert_eq!(stats.natural_closes, 0);

        let last_drain = sink
            .batches
            .iter()
            .rposition(|(k, _, _)| *k == BatchKind::Drain)
            .unwrap();
        let tail = &sink.batches[last_drain + 1..];
        assert_eq!(tail.len(), still_active);
        assert!(tail.iter().all(|(k, _, _)| *k == BatchKind::Close));
        assert_eq!(stats.open_instances(), 0);
    }

    #[test]
    fn test_last_drain_exhausting_instance_adds_no_close_batch() {
        let sched = scheduler(vec![model("one-shot", 10, 2, 1, 0)], 10, 1);
        let mut sink = RecordingSink::default();
        let stats = sched.run(1, &mut sink).unwrap();

        let kinds: Vec<BatchKind> = sink.batches.iter().map(|(k, _, _)| *k).collect();
        assert_eq!(kinds, vec![BatchKind::Open, BatchKind::Drain]);
        assert_eq!(stats.natural_closes, 1);
        assert_eq!(stats.shutdown_closes, 0);
        assert_eq!(
            sink.batches[1].2,
            "x.0000000000000000 read 0 4096\n\
             x.0000000000000000 close\nx.0000000000000001 close\n"
        );
    }

    #[test]
    fn test_close_batches_after_last_drain_match_active_instances() {
        // Short models finish mid-run, so the last drain often exhausts one
        for seed in 0..20 {
            let sched = scheduler(vec![model("a", 10, 1, 2, 1), model("b", 10, 2, 3, 2)], 50, seed);
            let mut sink = RecordingSink::default();
            let stats = sched.run(37, &mut sink).unwrap();

            let last_drain = sink
                .batches
                .iter()
                .rposition(|(k, _, _)| *k == BatchKind::Drain)
                .unwrap();
            let tail = &sink.batches[last_drain + 1..];
            assert_eq!(tail.len() as u64, stats.shutdown_closes, "seed {}", seed);
            assert!(tail.iter().all(|(k, _, _)| *k == BatchKind::Close));
        }
    }

    #[test]
    fn test_zero_op_model_closed_in_open_batch() {
        let sched = scheduler(vec![model("empty", 10, 1, 0, 0), model("m", 10, 1, 3, 1)], 100, 2);
        let mut sink = RecordingSink::default();
        let stats = sched.run(20, &mut sink).unwrap();

        let empty_admissions = stats.admissions_by_model.get("empty").copied().unwrap_or(0);
        assert!(empty_admissions > 0);
        let closing_opens = sink
            .batches
            .iter()
            .filter(|(k, _, cmds)| *k == BatchKind::Open && cmds.ends_with(" close\n"))
            .count() as u64;
        assert_eq!(closing_opens, empty_admissions);
    }

    #[test]
    fn test_every_admission_closed_exactly_once() {
        // A tight pool lets simulated time advance so instances run to completion
        let sched = scheduler(vec![model("a", 10, 1, 3, 1), model("b", 10, 2, 8, 2)], 40, 11);
        let mut sink = RecordingSink::default();
        let stats = sched.run(400, &mut sink).unwrap();

        assert_eq!(sink.count(BatchKind::Open) as u64, stats.admissions);
        assert_eq!(stats.natural_closes + stats.shutdown_closes, stats.admissions);
        assert_eq!(sink.count(BatchKind::Close) as u64, stats.shutdown_closes);
        assert!(stats.natural_closes > 0);

        // Every opened object is closed exactly once
        let opened = command_lines(&sink, "open");
        let mut closed = command_lines(&sink, "close");
        closed.sort();
        let mut expected = opened.clone();
        expected.sort();
        assert_eq!(closed, expected);
    }

    #[test]
    fn test_shorter_model_admitted_more_often() {
        let sched = scheduler(vec![model("short", 10, 1, 1, 0), model("long", 100, 1, 1, 0)], 1_000_000, 42);
        let mut sink = RecordingSink::default();
        let stats = sched.run(100_000, &mut sink).unwrap();

        let short = stats.admissions_by_model["short"] as f64;
        let long = stats.admissions_by_model["long"] as f64;
        let ratio = short / long;
        assert!(ratio > 9.0 && ratio < 11.0, "ratio {} not close to 10", ratio);
    }

    #[test]
    fn test_starvation_stops_unbounded_run() {
        // 10 objects, 2 per instance: at most 5 instances ever
        let sched = scheduler(vec![model("m", 10, 2, 3, 1)], 10, 8);
        let mut sink = RecordingSink::default();
        let stats = sched.run(0, &mut sink).unwrap();

        assert!(stats.pool_starved);
        assert_eq!(stats.admissions, 5);
        assert_eq!(stats.drains, 15);
        assert_eq!(stats.objects_used, 10);
        assert_eq!(stats.natural_closes, 5);
        assert_eq!(sink.count(BatchKind::Close), 0);
        assert_eq!(command_lines(&sink, "close").len(), 10);
    }

    #[test]
    fn test_deferral_under_contention() {
        // Known approximation: the deferred model is dropped and the next tick
        // re-samples, so the big model loses share once the pool is tight.
        let mut sched = scheduler(vec![model("small", 10, 1, 50, 1), model("big", 10, 9, 50, 1)], 12, 4);
        let mut sink = RecordingSink::default();
        for _ in 0..40 {
            sched.tick(&mut sink).unwrap();
        }
        assert!(sched.stats().deferrals > 0);
        assert!(sched.pool().names_count() <= 12);
    }

    #[test]
    fn test_retain_policy_terminates_unbounded() {
        let registry = ModelRegistry::new(vec![model("small", 10, 1, 2, 1), model("big", 10, 4, 2, 1)]);
        let sampler = WeightedSampler::new(registry.models()).unwrap();
        let sched = Scheduler::new(
            sampler,
            ObjectPool::new("r.", 6),
            DeferralPolicy::Retain,
            Box::new(XoshiroSource::with_seed(21)),
        )
        .unwrap();

        let mut sink = RecordingSink::default();
        let stats = sched.run(0, &mut sink).unwrap();

        assert!(stats.pool_starved);
        assert!(stats.objects_used <= 6);
        assert_eq!(stats.open_instances(), 0);
        assert_eq!(stats.drains, stats.admissions * 2);
    }

    #[test]
    fn test_scripted_admission_order() {
        let models = vec![model("a", 10, 1, 2, 10), model("b", 10, 1, 2, 10)];
        let registry = ModelRegistry::new(models);
        let sampler = WeightedSampler::new(registry.models()).unwrap();
        let sched = Scheduler::new(
            sampler,
            ObjectPool::new("s.", 100),
            DeferralPolicy::Resample,
            Box::new(ScriptedSource::new(vec![0.0, 0.75])),
        )
        .unwrap();

        let mut sink = RecordingSink::default();
        sched.run(2, &mut sink).unwrap();

        let kinds: Vec<(BatchKind, u64)> = sink.batches.iter().map(|(k, t, _)| (*k, *t)).collect();
        assert_eq!(
            kinds,
            vec![
                (BatchKind::Open, 0),  // a at t=0
                (BatchKind::Drain, 0), // a op 0
                (BatchKind::Open, 10), // b admitted at a's next event
                (BatchKind::Drain, 10), // a op 1 (inserted before b), a closed
                (BatchKind::Close, 10), // b closed at shutdown
            ]
        );
        assert_eq!(sink.batches[1].2, "s.0000000000000000 read 0 4096\n");
        assert_eq!(
            sink.batches[3].2,
            "s.0000000000000000 read 4096 4096\ns.0000000000000000 close\n"
        );
    }

    #[test]
    fn test_oversized_models_rejected() {
        let registry = ModelRegistry::new(vec![model("huge", 10, 50, 1, 0)]);
        let sampler = WeightedSampler::new(registry.models()).unwrap();
        let result = Scheduler::new(
            sampler,
            ObjectPool::new("x.", 10),
            DeferralPolicy::Retain,
            Box::new(XoshiroSource::with_seed(1)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_deterministic_with_seed() {
        let run = |seed| {
            let sched = scheduler(vec![model("a", 10, 1, 4, 3), model("b", 25, 2, 9, 2)], 200, seed);
            let mut sink = RecordingSink::default();
            sched.run(300, &mut sink).unwrap();
            sink.batches
        };
        assert_eq!(run(123), run(123));
    }

    #[test]
    fn test_generate_trace_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("models.txt");
        let out_path = dir.path().join("trace.iolog");

        let mut file = fs::File::create(&model_path).unwrap();
        writeln!(file, "model m length=10 objects=2").unwrap();
        for i in 0..5 {
            writeln!(file, "{} write {} 0 4096", i * 2, i % 2).unwrap();
        }
        writeln!(file, "end").unwrap();

        let config = GeneratorConfig {
            model: Some(model_path.clone()),
            output: Some(out_path.clone()),
            operations: 1,
            max_objects: 10,
            prefix: "x.".to_string(),
            seed: Some(5),
            ..Default::default()
        };
        let registry = crate::model::loader::load_models(&model_path).unwrap();
        let stats = generate_trace(&config, &registry).unwrap();

        let trace = fs::read_to_string(&out_path).unwrap();
        assert!(trace.starts_with(IOLOG_HEADER));
        assert_eq!(
            trace,
            "fio version 2 iolog\n\
             x.0000000000000000 add\nx.0000000000000000 open\n\
             x.0000000000000001 add\nx.0000000000000001 open\n\
             x.0000000000000000 write 0 4096\n\
             x.0000000000000000 close\nx.0000000000000001 close\n"
        );
        assert_eq!(stats.objects_used, 2);
    }

    #[test]
    fn test_generate_trace_rejects_oversized_models() {
        let registry = ModelRegistry::new(vec![model("huge", 10, 50, 1, 0)]);
        let config = GeneratorConfig {
            max_objects: 10,
            ..Default::default()
        };
        assert!(generate_trace(&config, &registry).is_err());
    }

    #[test]
    fn test_models_share_registry_handles() {
        let registry = ModelRegistry::new(vec![model("a", 10, 1, 1, 0)]);
        let sampler = WeightedSampler::new(registry.models()).unwrap();
        assert!(Arc::ptr_eq(&registry.models()[0], &sampler.models()[0]));
    }
}
