use super::{Context, Slot, StepError};
use crate::progress::ProgressSender;
use serde::de::DeserializeOwned;
use serde::Serialize;

type RunFn<C, T> =
    dyn Fn(&mut Context<C>, &ProgressSender) -> Result<T, StepError> + Send + Sync;
type KeyFn<C> = dyn Fn(&mut Context<C>) -> String + Send + Sync;

pub trait StepRunner<C>: Send + Sync {
    fn name(&self) -> &str;
    fn message(&self) -> &str;
    fn is_silent(&self) -> bool;
    fn is_cacheable(&self) -> bool;
    fn declared_cache_key(&self, ctx: &mut Context<C>) -> Option<String>;
    fn run(&self, ctx: &mut Context<C>, progress: &ProgressSender) -> Result<(), StepError>;
}

enum CacheKey<C> {
    Static(String),
    Derived(Box<KeyFn<C>>),
}

pub struct Step<C, T> {
    slot: Slot<T>,
    message: String,
    silent: bool,
    run: Box<RunFn<C, T>>,
    cache_key: Option<CacheKey<C>>,
}

impl<C, T> Step<C, T> {
    pub fn new<F>(slot: Slot<T>, message: &str, run: F) -> Self
    where
        F: Fn(&mut Context<C>, &ProgressSender) -> Result<T, StepError> + Send + Sync + 'static,
    {
        Self {
            slot,
            message: message.to_string(),
            silent: false,
            run: Box::new(run),
            cache_key: None,
        }
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn cache_key(mut self, key: &str) -> Self {
        self.cache_key = Some(CacheKey::Static(key.to_string()));
        self
    }

    pub fn cache_key_fn<F>(mut self, derive: F) -> Self
    where
        F: Fn(&mut Context<C>) -> String + Send + Sync + 'static,
    {
        self.cache_key = Some(CacheKey::Derived(Box::new(derive)));
        self
    }
}

impl<C, T> StepRunner<C> for Step<C, T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &str {
        self.slot.name()
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn is_silent(&self) -> bool {
        self.silent
    }

    fn declared_cache_key(&self, ctx: &mut Context<C>) -> Option<String> {
        match &self.cache_key {
            Some(CacheKey::Static(key)) => Some(key.clone()),
            Some(CacheKey::Derived(derive)) => Some(derive(ctx)),
            None => None,
        }
    }

    fn run(&self, ctx: &mut Context<C>, progress: &ProgressSender) -> Result<(), StepError> {
        let value = (self.run)(ctx, progress)?;
        ctx.set(&self.slot, value);
        Ok(())
    }

    fn is_cacheable(&self) -> bool {
        self.cache_key.is_some()
    }
}

type ActionFn<C> = dyn Fn(&mut Context<C>) -> Result<(), StepError> + Send + Sync;

pub(crate) struct ActionStep<C> {
    name: &'static str,
    action: Box<ActionFn<C>>,
}

impl<C> ActionStep<C> {
    pub(crate) fn new<F>(name: &'static str, action: F) -> Self
    where
        F: Fn(&mut Context<C>) -> Result<(), StepError> + Send + Sync + 'static,
    {
        Self {
            name,
            action: Box::new(action),
        }
    }
}

impl<C> StepRunner<C> for ActionStep<C> {
    fn name(&self) -> &str {
        self.name
    }

    fn message(&self) -> &str {
        ""
    }

    fn is_silent(&self) -> bool {
        true
    }

    fn declared_cache_key(&self, _ctx: &mut Context<C>) -> Option<String> {
        None
    }

    fn run(&self, ctx: &mut Context<C>, _progress: &ProgressSender) -> Result<(), StepError> {
        (self.action)(ctx)
    }

    fn is_cacheable(&self) -> bool {
        false
    }
}
