//! A deterministic stand-in for an LLVM pass-ordering environment.
//!
//! Each benchmark is reduced to a profile of instruction counts per category.
//! Passes rewrite that profile and the reward is the drop in total
//! instruction count, so shrinking passes score positive and code-growing
//! passes (inlining, unrolling) score negative.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::datasets::Corpora;
use super::wrappers::TimeLimit;
use super::{Benchmark, Env, EnvError, EnvProvider, Step};

/// Instruction categories tracked per program.
pub const CATEGORIES: usize = 8;

const ALLOCA: usize = 0;
const LOAD: usize = 1;
const STORE: usize = 2;
const ARITH: usize = 3;
const BRANCH: usize = 4;
const CALL: usize = 5;
const PHI: usize = 6;
const DEAD: usize = 7;

/// Index into [`PASSES`].
pub type Action = usize;

pub const PASSES: &[&str] = &[
    "-mem2reg",
    "-sroa",
    "-instcombine",
    "-dce",
    "-simplifycfg",
    "-gvn",
    "-licm",
    "-inline",
    "-loop-unroll",
    "-adce",
];

/// Resolve a pass flag such as `-gvn` (leading dash optional) to its action.
pub fn action_for(flag: &str) -> Option<Action> {
    let flag = flag.trim_start_matches('-');
    PASSES.iter().position(|p| p.trim_start_matches('-') == flag)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub counts: [u64; CATEGORIES],
    pub steps: u32,
}

impl Observation {
    pub fn instruction_count(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepInfo {
    pub pass: &'static str,
    pub instruction_count: u64,
}

/// Derive the starting profile of a benchmark from its URI.
///
/// The seed is the first eight bytes of the URI's BLAKE3 digest, so profiles
/// (and every reward derived from them) are the same on every build.
fn profile(benchmark: &Benchmark) -> [u64; CATEGORIES] {
    let digest = blake3::hash(benchmark.uri().as_bytes());
    let bytes: [u8; 8] = digest.as_bytes()[..8].try_into().unwrap_or([0u8; 8]);
    let mut state = u64::from_le_bytes(bytes);

    let mut counts = [0u64; CATEGORIES];
    for count in counts.iter_mut() {
        // splitmix64
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        *count = 10 + z % 300;
    }
    counts
}

fn apply(action: Action, c: &mut [u64; CATEGORIES]) {
    match action {
        // mem2reg
        0 => {
            let promoted = c[ALLOCA];
            c[LOAD] -= c[LOAD].min(promoted * 2);
            c[STORE] -= c[STORE].min(promoted);
            c[PHI] += promoted / 2;
            c[ALLOCA] = 0;
        }
        // sroa
        1 => {
            let split = c[ALLOCA] / 2;
            c[ALLOCA] -= split;
            c[LOAD] -= c[LOAD].min(split);
            c[STORE] -= c[STORE].min(split / 2);
            c[PHI] += split / 4;
        }
        // instcombine
        2 => {
            let folded = c[ARITH] / 5;
            c[ARITH] -= folded;
            c[DEAD] += folded / 4;
        }
        // dce
        3 => c[DEAD] = 0,
        // simplifycfg
        4 => {
            c[BRANCH] -= c[BRANCH] / 4;
            c[PHI] -= c[PHI] / 3;
        }
        // gvn
        5 => {
            c[LOAD] -= c[LOAD] / 6;
            c[ARITH] -= c[ARITH] / 8;
        }
        // licm moves code without changing its size
        6 => {}
        // inline
        7 => {
            let inlined = c[CALL] / 2;
            c[CALL] -= inlined;
            c[ARITH] += inlined * 3;
            c[BRANCH] += inlined;
        }
        // loop-unroll
        8 => {
            c[ARITH] += c[ARITH] / 10;
            c[BRANCH] -= c[BRANCH] / 10;
        }
        // adce
        9 => {
            c[DEAD] = 0;
            c[BRANCH] -= c[BRANCH] / 20;
        }
        _ => unreachable!("action range is checked before apply"),
    }
}

struct Episode {
    counts: [u64; CATEGORIES],
    steps: u32,
    reward: f64,
}

/// Pass-ordering environment over a fixed set of corpora.
pub struct PassPipelineEnv {
    corpora: Arc<Corpora>,
    episode: Option<Episode>,
    closed: bool,
}

impl PassPipelineEnv {
    pub fn new(corpora: Arc<Corpora>) -> Self {
        Self {
            corpora,
            episode: None,
            closed: false,
        }
    }
}

impl Env for PassPipelineEnv {
    type Obs = Observation;
    type Act = Action;
    type Info = StepInfo;

    fn reset(&mut self, benchmark: &Benchmark) -> Result<Observation, EnvError> {
        if self.closed {
            return Err(EnvError::Closed);
        }
        if !self.corpora.contains(benchmark) {
            return Err(EnvError::UnknownBenchmark(benchmark.to_string()));
        }
        let counts = profile(benchmark);
        debug!(%benchmark, instructions = counts.iter().sum::<u64>(), "reset");
        self.episode = Some(Episode {
            counts,
            steps: 0,
            reward: 0.0,
        });
        Ok(Observation { counts, steps: 0 })
    }

    fn step(&mut self, action: Action) -> Result<Step<Observation, StepInfo>, EnvError> {
        if self.closed {
            return Err(EnvError::Closed);
        }
        let episode = self.episode.as_mut().ok_or(EnvError::NotReset)?;
        if action >= PASSES.len() {
            return Err(EnvError::InvalidAction {
                action,
                size: PASSES.len(),
            });
        }

        let before: u64 = episode.counts.iter().sum();
        apply(action, &mut episode.counts);
        let after: u64 = episode.counts.iter().sum();
        let reward = before as f64 - after as f64;

        episode.steps += 1;
        episode.reward += reward;
        trace!(pass = PASSES[action], reward, instructions = after, "step");

        Ok(Step {
            obs: Observation {
                counts: episode.counts,
                steps: episode.steps,
            },
            reward,
            done: false,
            info: StepInfo {
                pass: PASSES[action],
                instruction_count: after,
            },
        })
    }

    fn episode_reward(&self) -> f64 {
        self.episode.as_ref().map_or(0.0, |e| e.reward)
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.closed = true;
        self.episode = None;
        Ok(())
    }
}

/// Builds step-capped [`PassPipelineEnv`]s over shared corpora.
#[derive(Clone)]
pub struct PassPipelineProvider {
    corpora: Arc<Corpora>,
    max_episode_steps: u32,
}

impl PassPipelineProvider {
    pub fn new(corpora: Corpora, max_episode_steps: u32) -> Self {
        Self {
            corpora: Arc::new(corpora),
            max_episode_steps,
        }
    }

    pub fn corpora(&self) -> &Corpora {
        &self.corpora
    }
}

impl EnvProvider for PassPipelineProvider {
    type Env = TimeLimit<PassPipelineEnv>;

    fn make_env(&self) -> Result<Self::Env, EnvError> {
        Ok(TimeLimit::new(
            PassPipelineEnv::new(self.corpora.clone()),
            self.max_episode_steps,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> PassPipelineEnv {
        PassPipelineEnv::new(Arc::new(Corpora::default()))
    }

    fn sha() -> Benchmark {
        Benchmark::from_parts("chstone-v0", "sha")
    }

    #[test]
    fn test_action_lookup() {
        assert_eq!(action_for("-mem2reg"), Some(0));
        assert_eq!(action_for("gvn"), Some(5));
        assert_eq!(action_for("-vectorize"), None);
    }

    #[test]
    fn test_reset_is_deterministic() {
        let a = env().reset(&sha()).unwrap();
        let b = env().reset(&sha()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.steps, 0);
    }

    #[test]
    fn test_profile_depends_only_on_uri() {
        let again = Benchmark::new(&sha().to_string());
        assert_eq!(profile(&sha()), profile(&again));
        let aes = Benchmark::from_parts("chstone-v0", "aes");
        assert_ne!(profile(&sha()), profile(&aes));
        assert!(profile(&sha()).iter().all(|c| (10..310).contains(c)));
    }

    #[test]
    fn test_reward_is_instruction_drop() {
        let mut env = env();
        let obs = env.reset(&sha()).unwrap();
        let step = env.step(action_for("-mem2reg").unwrap()).unwrap();
        let expected = obs.instruction_count() as f64 - step.obs.instruction_count() as f64;
        assert_eq!(step.reward, expected);
        assert_eq!(step.info.instruction_count, step.obs.instruction_count());
        assert_eq!(env.episode_reward(), expected);
    }

    #[test]
    fn test_licm_keeps_size() {
        let mut env = env();
        env.reset(&sha()).unwrap();
        let step = env.step(action_for("-licm").unwrap()).unwrap();
        assert_eq!(step.reward, 0.0);
    }

    #[test]
    fn test_inline_grows_code() {
        let mut env = env();
        env.reset(&sha()).unwrap();
        let step = env.step(action_for("-inline").unwrap()).unwrap();
        assert!(step.reward <= 0.0);
    }

    #[test]
    fn test_dce_is_idempotent() {
        let mut env = env();
        env.reset(&sha()).unwrap();
        env.step(action_for("-dce").unwrap()).unwrap();
        let again = env.step(action_for("-dce").unwrap()).unwrap();
        assert_eq!(again.reward, 0.0);
    }

    #[test]
    fn test_step_errors() {
        let mut env = env();
        assert!(matches!(env.step(0), Err(EnvError::NotReset)));
        env.reset(&sha()).unwrap();
        assert!(matches!(
            env.step(PASSES.len()),
            Err(EnvError::InvalidAction { .. })
        ));
        env.close().unwrap();
        assert!(matches!(env.step(0), Err(EnvError::Closed)));
    }

    #[test]
    fn test_unknown_benchmark() {
        let mut env = env();
        let err = env.reset(&Benchmark::from_parts("chstone-v0", "md5")).unwrap_err();
        assert!(matches!(err, EnvError::UnknownBenchmark(_)));
    }

    #[test]
    fn test_provider_caps_episode() {
        let provider = PassPipelineProvider::new(Corpora::default(), 5);
        let mut env = provider.make_env().unwrap();
        env.reset(&sha()).unwrap();
        let dones: Vec<bool> = (0..5).map(|_| env.step(6).unwrap().done).collect();
        assert_eq!(dones, vec![false, false, false, false, true]);
    }
}
