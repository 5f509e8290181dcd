use std::sync::Arc;

use async_trait::async_trait;
use serde::de::IgnoredAny;
use tokio::sync::Mutex;
use tracing::info;

use super::errors::ApiError;
use super::types::{EvaluateResponse, TrainResponse};
use crate::config::{AppConfig, ConfigError};
use crate::env::passes::{Action, Observation};
use crate::env::{Corpora, DatasetSplit, Env, EnvProvider, PassPipelineProvider, datasets};
use crate::eval::{RegressionScope, SequenceEvaluator, SequencePair};
use crate::learner::{AgentHandle, Trainer};
use crate::passgym_task;
use crate::runtime::{self, BlockingScheduler, MethodDefinition, Scheduler, Service, Verb, codec};
use crate::train::{QLearningTrainer, TrainConfig};

const METHODS: &[MethodDefinition] = &[
    MethodDefinition {
        name: "train",
        verb: Verb::Post,
    },
    MethodDefinition {
        name: "evaluate",
        verb: Verb::Get,
    },
];

/// Everything a train or evaluate call needs besides the agent.
pub struct Workspace<P> {
    pub provider: P,
    pub datasets: DatasetSplit,
    pub sequences: SequencePair<Action>,
    pub scope: RegressionScope,
    pub train: TrainConfig,
}

impl Workspace<PassPipelineProvider> {
    /// Simulated pass-pipeline environment with the configured split and sequences.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let provider = PassPipelineProvider::new(Corpora::default(), config.max_episode_steps);
        let datasets = datasets::split(provider.corpora(), &config.datasets)?;
        Ok(Self {
            provider,
            datasets,
            sequences: config.evaluation.sequences()?,
            scope: config.evaluation.regression_scope,
            train: config.train.clone(),
        })
    }
}

/// Train/evaluate facade. Holds the agent produced by the last `train`;
/// calls are serialized through one lock.
pub struct OptimizerService<P> {
    workspace: Arc<Workspace<P>>,
    scheduler: BlockingScheduler,
    agent: Mutex<Option<AgentHandle<Observation, Action>>>,
}

impl<P> OptimizerService<P>
where
    P: EnvProvider + 'static,
    P::Env: Env<Obs = Observation, Act = Action>,
{
    pub fn new(workspace: Workspace<P>, scheduler: BlockingScheduler) -> Self {
        Self {
            workspace: Arc::new(workspace),
            scheduler,
            agent: Mutex::new(None),
        }
    }

    pub async fn train(&self) -> Result<TrainResponse, ApiError> {
        let mut agent = self.agent.lock().await;
        let ws = self.workspace.clone();
        let handle = self.scheduler.submit(passgym_task!(move || {
            let mut trainer =
                QLearningTrainer::new(&ws.provider, ws.datasets.train.clone(), ws.train.clone());
            trainer.train()
        }));
        let trained = handle.await??;
        info!(agent = %trained.id(), "agent trained");
        *agent = Some(trained);
        Ok(TrainResponse {
            message: "Training completed!".to_string(),
        })
    }

    pub async fn evaluate(&self) -> Result<EvaluateResponse, ApiError> {
        let agent = self.agent.lock().await;
        let trained = agent.as_ref().cloned().ok_or(ApiError::NotTrained)?;
        let ws = self.workspace.clone();
        let handle = self.scheduler.submit(passgym_task!(move || {
            evaluate(&ws, &trained)
        }));
        let response = handle.await??;
        info!(
            val = response.val_rewards.len(),
            test = response.test_rewards.len(),
            "evaluation finished"
        );
        Ok(response)
    }
}

/// Heuristic over the validation set, agent over the test set.
pub fn evaluate<P>(
    ws: &Workspace<P>,
    agent: &AgentHandle<Observation, Action>,
) -> Result<EvaluateResponse, ApiError>
where
    P: EnvProvider,
    P::Env: Env<Obs = Observation, Act = Action>,
{
    let evaluator = SequenceEvaluator::new(&ws.provider).with_scope(ws.scope);
    let val_rewards = evaluator.evaluate(&ws.datasets.val, &ws.sequences)?;
    let test_rewards = evaluator.evaluate_with_agent(agent, &ws.datasets.test)?;
    Ok(EvaluateResponse {
        val_rewards,
        test_rewards,
    })
}

#[async_trait]
impl<P> Service for OptimizerService<P>
where
    P: EnvProvider + 'static,
    P::Env: Env<Obs = Observation, Act = Action>,
{
    type Error = ApiError;

    fn service_name(&self) -> &'static str {
        "optimizer"
    }

    fn methods(&self) -> &'static [MethodDefinition] {
        METHODS
    }

    async fn call_method(&self, method_name: &str, args: Vec<u8>) -> Result<Vec<u8>, ApiError> {
        // Both methods take no arguments; any well-formed body is ignored.
        codec::decode::<IgnoredAny>(&args)?;
        match method_name {
            "train" => Ok(codec::encode(&self.train().await?)?),
            "evaluate" => Ok(codec::encode(&self.evaluate().await?)?),
            other => Err(runtime::Error::UnknownMethod(other.to_string()).into()),
        }
    }
}
