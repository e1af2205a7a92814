//! A rack of generator instances sharing one input stream.

use cg_engine::{
    create_generator, find_param, BlockBuffer, Controls, Generator, ParamInfo, RunReport,
    DEFAULT_BLOCK_CAPACITY,
};
use cg_ir::TimedEvent;
use slotmap::{new_key_type, SlotMap};
use tracing::{debug, info, warn};

use crate::config::{GeneratorConfig, RackConfig};
use crate::HostError;

new_key_type! {
    /// Handle to one generator instance in a [`Rack`].
    pub struct InstanceKey;
}

struct Instance {
    generator: Box<dyn Generator>,
    controls: Controls,
    output: BlockBuffer<DEFAULT_BLOCK_CAPACITY>,
    /// Merge position in `output`
    cursor: usize,
}

/// Independent generator instances fed the same events.
///
/// Each block every instance runs on the whole input with its own
/// controls; their outputs are merged by frame, ties going to the
/// instance added first.
#[derive(Default)]
pub struct Rack {
    instances: SlotMap<InstanceKey, Instance>,
    /// Insertion order, for deterministic merging
    order: Vec<InstanceKey>,
}

impl Rack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every generator a configuration names, with its controls.
    pub fn from_config(config: &RackConfig) -> Result<Self, HostError> {
        let mut rack = Self::new();
        for entry in &config.generators {
            rack.add_configured(entry)?;
        }
        Ok(rack)
    }

    /// Add a generator by URI or short name.
    ///
    /// Every control starts bound to its default value, the way a plugin
    /// host connects all ports before the first block.
    pub fn add(&mut self, name: &str, seed: Option<u64>) -> Result<InstanceKey, HostError> {
        let generator =
            create_generator(name, seed).ok_or_else(|| HostError::UnknownGenerator(name.to_string()))?;
        info!(generator = generator.info().short_name, "added generator");
        let controls = default_controls(generator.info().params);
        let key = self.instances.insert(Instance {
            generator,
            controls,
            output: BlockBuffer::new(),
            cursor: 0,
        });
        self.order.push(key);
        Ok(key)
    }

    fn add_configured(&mut self, entry: &GeneratorConfig) -> Result<InstanceKey, HostError> {
        let key = self.add(&entry.kind, entry.seed)?;
        for (symbol, &value) in &entry.controls {
            if let Err(e) = self.set_control(key, symbol, value) {
                self.remove(key);
                return Err(e);
            }
        }
        Ok(key)
    }

    pub fn remove(&mut self, key: InstanceKey) -> bool {
        self.order.retain(|&k| k != key);
        self.instances.remove(key).is_some()
    }

    /// Set a control by symbol on one instance.
    pub fn set_control(&mut self, key: InstanceKey, symbol: &str, value: f32) -> Result<(), HostError> {
        let instance = self
            .instances
            .get_mut(key)
            .ok_or_else(|| HostError::Config("no such generator instance".into()))?;
        let info = instance.generator.info();
        let param = find_param(info.params, symbol).ok_or_else(|| HostError::UnknownControl {
            generator: info.short_name.to_string(),
            control: symbol.to_string(),
        })?;
        instance.controls.set(param.id, value);
        Ok(())
    }

    pub fn controls(&self, key: InstanceKey) -> Option<&Controls> {
        self.instances.get(key).map(|i| &i.controls)
    }

    pub fn generator(&self, key: InstanceKey) -> Option<&dyn Generator> {
        self.instances.get(key).map(|i| i.generator.as_ref())
    }

    /// Instance keys in insertion order.
    pub fn keys(&self) -> &[InstanceKey] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Notes started and not yet released, across all instances.
    pub fn sounding_count(&self) -> usize {
        self.instances.values().map(|i| i.generator.sounding_count()).sum()
    }

    /// Mark a control absent on one instance.
    pub fn unset_control(&mut self, key: InstanceKey, symbol: &str) -> Result<(), HostError> {
        let instance = self
            .instances
            .get_mut(key)
            .ok_or_else(|| HostError::Config("no such generator instance".into()))?;
        let info = instance.generator.info();
        let param = find_param(info.params, symbol).ok_or_else(|| HostError::UnknownControl {
            generator: info.short_name.to_string(),
            control: symbol.to_string(),
        })?;
        instance.controls.unset(param.id);
        Ok(())
    }

    /// Upper bound on the events one `process_block` or `flush` can emit.
    pub fn max_block_output(&self) -> usize {
        self.order.len() * DEFAULT_BLOCK_CAPACITY
    }

    /// Collect every instance's run report and log what happened.
    ///
    /// Call between blocks, never from inside the real-time section.
    /// Returns the rack-wide total.
    pub fn log_reports(&mut self) -> RunReport {
        let mut total = RunReport::default();
        for &key in &self.order {
            let Some(instance) = self.instances.get_mut(key) else {
                continue;
            };
            let report = instance.generator.take_report();
            if report.is_empty() {
                continue;
            }
            let generator = instance.generator.info().short_name;
            if report.dropped > 0 {
                warn!(generator, dropped = report.dropped, "output full, events dropped");
            }
            if report.key_shifts > 0 {
                debug!(generator, count = report.key_shifts, "key shift redrawn");
            }
            if report.regenerations > 0 {
                debug!(generator, count = report.regenerations, "pattern regenerated");
            }
            if report.learn_changes > 0 {
                debug!(generator, count = report.learn_changes, "learn mode changed");
            }
            total.absorb(report);
        }
        total
    }

    /// Run every instance on one block and hand the merged output to `emit`.
    ///
    /// Does not allocate.
    pub fn process_block(&mut self, input: &[TimedEvent], emit: &mut dyn FnMut(TimedEvent)) {
        for instance in self.instances.values_mut() {
            instance.output.clear();
            instance.generator.run(input, &instance.controls, &mut instance.output);
        }
        self.merge(emit);
    }

    /// Release every sounding note at `frame`.
    pub fn flush(&mut self, frame: u32, emit: &mut dyn FnMut(TimedEvent)) {
        for instance in self.instances.values_mut() {
            instance.output.clear();
            instance.generator.all_notes_off(frame, &mut instance.output);
        }
        self.merge(emit);
    }

    fn merge(&mut self, emit: &mut dyn FnMut(TimedEvent)) {
        for instance in self.instances.values_mut() {
            instance.cursor = 0;
        }
        loop {
            let mut next: Option<(u32, InstanceKey)> = None;
            for &key in &self.order {
                let Some(instance) = self.instances.get(key) else {
                    continue;
                };
                if let Some(event) = instance.output.events().get(instance.cursor) {
                    if next.map_or(true, |(frame, _)| event.frame < frame) {
                        next = Some((event.frame, key));
                    }
                }
            }
            let Some((_, key)) = next else {
                break;
            };
            let Some(instance) = self.instances.get_mut(key) else {
                break;
            };
            emit(instance.output.events()[instance.cursor]);
            instance.cursor += 1;
        }
    }
}

fn default_controls(params: &[ParamInfo]) -> Controls {
    let mut controls = Controls::new();
    for param in params {
        controls.set(param.id, param.default);
    }
    controls
}
