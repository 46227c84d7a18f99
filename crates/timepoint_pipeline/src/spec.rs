//! Pipeline specifications and their validation pass.

use derive_getters::Getters;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use timepoint_error::{PipelineError, PipelineErrorKind, PipelineResult};
use timepoint_interface::StepCapability;
use tracing::{debug, instrument};

/// One step of a pipeline.
///
/// Steps are required with weight 1 unless configured otherwise.
#[derive(Clone, Getters)]
pub struct StepNode {
    /// Unique step name
    name: String,
    /// Steps that must settle before this one starts
    after: Vec<String>,
    /// Work performed by this step
    capability: Arc<dyn StepCapability>,
    /// Concurrency group label
    group: Option<String>,
    /// Whether a failure aborts the run
    required: bool,
    /// Share of the progress bar this step accounts for
    weight: u32,
}

impl StepNode {
    /// Create a required step with no predecessors.
    pub fn new(name: impl Into<String>, capability: Arc<dyn StepCapability>) -> Self {
        Self {
            name: name.into(),
            after: Vec::new(),
            capability,
            group: None,
            required: true,
            weight: 1,
        }
    }

    /// Declare predecessors.
    pub fn depends_on<I, S>(mut self, predecessors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(predecessors.into_iter().map(Into::into));
        self
    }

    /// Put the step in a concurrency group.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set whether a failure aborts the run.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Mark the step optional.
    pub fn optional(self) -> Self {
        self.with_required(false)
    }

    /// Set the progress weight.
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }
}

impl std::fmt::Debug for StepNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepNode")
            .field("name", &self.name)
            .field("after", &self.after)
            .field("capability", &self.capability.name())
            .field("group", &self.group)
            .field("required", &self.required)
            .field("weight", &self.weight)
            .finish()
    }
}

/// An immutable, validated step graph.
///
/// Built once through [`PipelineSpec::builder`]; a spec that exists is known
/// to be acyclic with every predecessor declared.
///
/// # Examples
///
/// ```rust,ignore
/// let spec = PipelineSpec::builder("scene")
///     .step(StepNode::new("judge", judge))
///     .step(StepNode::new("timeline", timeline).depends_on(["judge"]))
///     .step(StepNode::new("scene", scene).depends_on(["timeline"]).in_group("parallel"))
///     .step(StepNode::new("camera", camera).depends_on(["timeline"]).in_group("parallel"))
///     .group_limit("parallel", 2)
///     .build()?;
///
/// assert_eq!(spec.phases()[2], vec!["scene", "camera"]);
/// ```
#[derive(Debug, Clone, Getters)]
pub struct PipelineSpec {
    /// Pipeline name
    name: String,
    /// Steps in declaration order
    steps: Vec<StepNode>,
    /// Concurrency caps per group
    group_limits: HashMap<String, usize>,
    /// Ready sets of a fully settled run, in order
    phases: Vec<Vec<String>>,
    #[getter(skip)]
    index: HashMap<String, usize>,
}

impl PipelineSpec {
    /// Start declaring a pipeline.
    pub fn builder(name: impl Into<String>) -> PipelineSpecBuilder {
        PipelineSpecBuilder {
            name: name.into(),
            steps: Vec::new(),
            group_limits: HashMap::new(),
        }
    }

    /// Look up a step by name.
    pub fn step(&self, name: &str) -> Option<&StepNode> {
        self.index.get(name).map(|&i| &self.steps[i])
    }

    /// Sum of all step weights.
    pub fn total_weight(&self) -> u64 {
        self.steps.iter().map(|step| u64::from(step.weight)).sum()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a built spec.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps that (transitively) depend on `name`.
    pub fn downstream_of(&self, name: &str) -> Vec<&str> {
        let mut reached: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            for step in &self.steps {
                if step.after.iter().any(|p| p == current) && reached.insert(step.name.as_str()) {
                    queue.push_back(step.name.as_str());
                }
            }
        }
        self.steps
            .iter()
            .map(|step| step.name.as_str())
            .filter(|step| reached.contains(step))
            .collect()
    }
}

/// Collects steps and group caps, then validates them into a [`PipelineSpec`].
#[derive(Debug)]
pub struct PipelineSpecBuilder {
    name: String,
    steps: Vec<StepNode>,
    group_limits: HashMap<String, usize>,
}

impl PipelineSpecBuilder {
    /// Add a step.
    pub fn step(mut self, node: StepNode) -> Self {
        self.steps.push(node);
        self
    }

    /// Cap how many steps of `group` may run at once.
    pub fn group_limit(mut self, group: impl Into<String>, limit: usize) -> Self {
        self.group_limits.insert(group.into(), limit);
        self
    }

    /// Validate and freeze the spec.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is empty, a name repeats, a
    /// predecessor is undeclared, a group cap is zero, or the graph has a
    /// cycle.
    #[instrument(skip(self), fields(pipeline = %self.name, steps = self.steps.len()))]
    pub fn build(self) -> PipelineResult<PipelineSpec> {
        if self.steps.is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::EmptyPipeline));
        }

        let mut index = HashMap::new();
        for (i, step) in self.steps.iter().enumerate() {
            if index.insert(step.name.clone(), i).is_some() {
                return Err(PipelineError::new(PipelineErrorKind::DuplicateStep(
                    step.name.clone(),
                )));
            }
        }

        for step in &self.steps {
            for predecessor in &step.after {
                if !index.contains_key(predecessor) {
                    return Err(PipelineError::new(PipelineErrorKind::UnknownPredecessor {
                        step: step.name.clone(),
                        predecessor: predecessor.clone(),
                    }));
                }
            }
        }

        let mut groups: Vec<_> = self.group_limits.iter().collect();
        groups.sort();
        if let Some((group, _)) = groups.into_iter().find(|(_, limit)| **limit == 0) {
            return Err(PipelineError::new(PipelineErrorKind::InvalidGroupLimit(
                group.clone(),
            )));
        }

        let phases = layer(&self.steps, &index)?;
        debug!(phases = phases.len(), "Pipeline validated");

        Ok(PipelineSpec {
            name: self.name,
            steps: self.steps,
            group_limits: self.group_limits,
            phases,
            index,
        })
    }
}

/// Kahn's algorithm, one layer at a time.
fn layer(steps: &[StepNode], index: &HashMap<String, usize>) -> PipelineResult<Vec<Vec<String>>> {
    let mut pending: Vec<usize> = steps
        .iter()
        .map(|step| step.after.iter().collect::<HashSet<_>>().len())
        .collect();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];
    for (i, step) in steps.iter().enumerate() {
        let unique: HashSet<&String> = step.after.iter().collect();
        for predecessor in unique {
            successors[index[predecessor]].push(i);
        }
    }

    let mut phases = Vec::new();
    let mut ready: Vec<usize> = (0..steps.len()).filter(|&i| pending[i] == 0).collect();
    let mut placed = 0;

    while !ready.is_empty() {
        placed += ready.len();
        let mut next = Vec::new();
        for &i in &ready {
            for &successor in &successors[i] {
                pending[successor] -= 1;
                if pending[successor] == 0 {
                    next.push(successor);
                }
            }
        }
        next.sort_unstable();
        phases.push(ready.iter().map(|&i| steps[i].name.clone()).collect());
        ready = next;
    }

    if placed < steps.len() {
        return Err(PipelineError::new(PipelineErrorKind::Cycle(find_cycle(
            steps, index, &pending,
        ))));
    }
    Ok(phases)
}

/// Walk predecessors among unplaced steps until one repeats.
fn find_cycle(steps: &[StepNode], index: &HashMap<String, usize>, pending: &[usize]) -> Vec<String> {
    let Some(start) = (0..steps.len()).find(|&i| pending[i] > 0) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(next) = steps[current]
            .after
            .iter()
            .map(|p| index[p])
            .find(|&p| pending[p] > 0)
        else {
            return path.iter().map(|&i| steps[i].name.clone()).collect();
        };

        if let Some(position) = path.iter().position(|&i| i == next) {
            let mut cycle: Vec<String> = path[position..]
                .iter()
                .rev()
                .map(|&i| steps[i].name.clone())
                .collect();
            cycle.push(cycle[0].clone());
            return cycle;
        }
        path.push(next);
        current = next;
    }
}
