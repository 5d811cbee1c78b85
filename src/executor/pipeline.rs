use super::step::ActionStep;
use super::{effective_key, invalidate, Context, EffectiveKey, StepError, StepRunner};
use crate::config::Settings;
use crate::pagination::PageWindow;
use crate::progress::reporter::panic_message;
use crate::progress::{ProgressError, ProgressReporter, ProgressSender, TICK_INTERVAL};
use crate::remote::RemoteError;
use crate::shared::logging::EventLog;
use crate::store::{CacheStore, CachedResult, Namespace, StoreError, DEFAULT_CACHE_TTL};
use chrono::Utc;
use serde_json::Value;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const ACCOUNT_CONFIG_KEY: &str = "account_id";

type InvalidatesFn<C> = dyn Fn(&mut Context<C>) -> Vec<String> + Send + Sync;

// A cache hit restores the whole cached context and ends the run.
pub struct Pipeline<C> {
    store: Arc<CacheStore>,
    steps: Vec<Box<dyn StepRunner<C>>>,
    invalidates: Option<Box<InvalidatesFn<C>>>,
    args: Vec<String>,
    caching: bool,
    skip_cache: bool,
    log: EventLog,
    progress_out: Box<dyn Write + Send>,
    tick: Duration,
}

impl<C> Pipeline<C>
where
    C: Send + Sync + 'static,
{
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self {
            store,
            steps: Vec::new(),
            invalidates: None,
            args: Vec::new(),
            caching: true,
            skip_cache: false,
            log: EventLog::disabled(),
            progress_out: Box::new(io::stdout()),
            tick: TICK_INTERVAL,
        }
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn settings(mut self, settings: &Settings) -> Self {
        self.caching = settings.caching;
        self
    }

    pub fn caching(mut self, enabled: bool) -> Self {
        self.caching = enabled;
        self
    }

    pub fn skip_cache(mut self, skip: bool) -> Self {
        self.skip_cache = skip;
        self
    }

    pub fn log_to(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    pub fn progress_output(mut self, out: impl Write + Send + 'static) -> Self {
        self.progress_out = Box::new(out);
        self
    }

    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn step(mut self, step: impl StepRunner<C> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn with_client<F>(self, factory: F) -> Self
    where
        F: Fn() -> Result<C, RemoteError> + Send + Sync + 'static,
    {
        self.action("client", move |ctx| {
            let client = factory().map_err(|source| StepError::ClientSetup { source })?;
            ctx.set_client(client);
            Ok(())
        })
    }

    pub fn with_account(self, explicit: Option<String>) -> Self {
        let store = Arc::clone(&self.store);
        self.with_account_resolver(move |_| {
            if let Some(account_id) = explicit.as_deref().filter(|id| !id.trim().is_empty()) {
                return Ok(account_id.to_string());
            }
            match store.config_value(ACCOUNT_CONFIG_KEY) {
                Ok(Some(account_id)) if !account_id.trim().is_empty() => Ok(account_id),
                Ok(_) => Err(StepError::MissingAccount),
                Err(err) => Err(StepError::Failed(format!(
                    "failed to read selected account: {err}"
                ))),
            }
        })
    }

    pub fn with_account_resolver<F>(self, resolve: F) -> Self
    where
        F: Fn(&mut Context<C>) -> Result<String, StepError> + Send + Sync + 'static,
    {
        self.action("account", move |ctx| {
            let account_id = resolve(ctx)?;
            ctx.account_id = Some(account_id);
            Ok(())
        })
    }

    pub fn with_pagination(self, window: PageWindow) -> Self {
        self.action("pagination", move |ctx| {
            ctx.pagination = window;
            Ok(())
        })
    }

    pub fn with_confirmation<P, A>(self, prompt: P, confirm: A, assume_yes: bool) -> Self
    where
        P: Fn(&mut Context<C>) -> String + Send + Sync + 'static,
        A: Fn(&str) -> Result<bool, StepError> + Send + Sync + 'static,
    {
        self.action("confirmation", move |ctx| {
            if assume_yes {
                return Ok(());
            }
            let message = prompt(ctx);
            if confirm(&message)? {
                Ok(())
            } else {
                Err(StepError::Aborted)
            }
        })
    }

    pub fn invalidates<F>(mut self, tags: F) -> Self
    where
        F: Fn(&mut Context<C>) -> Vec<String> + Send + Sync + 'static,
    {
        self.invalidates = Some(Box::new(tags));
        self
    }

    pub fn run<D>(self, display: D)
    where
        D: FnOnce(&mut Context<C>),
    {
        let mut ctx = self.execute();
        display(&mut ctx);
    }

    pub fn execute(self) -> Context<C> {
        let Pipeline {
            store,
            steps,
            invalidates,
            args,
            caching,
            skip_cache,
            log,
            progress_out,
            tick,
        } = self;

        let cache_enabled = caching && !skip_cache && invalidates.is_none();
        let cache = CacheGate {
            store: &store,
            log: &log,
        };
        let mut reporter = ProgressReporter::new(progress_out).with_tick(tick);
        let mut ctx = Context::new(args);
        let started = Instant::now();

        for step in &steps {
            let key = if cache_enabled && step.is_cacheable() {
                step.declared_cache_key(&mut ctx).map(|declared| {
                    let key = effective_key(&declared, ctx.pagination);
                    (declared, key)
                })
            } else {
                None
            };

            if let Some((_, key)) = &key {
                if cache.restore(&mut ctx, key) {
                    ctx.set_duration(started.elapsed());
                    return ctx;
                }
            }

            if let Err(error) = run_step(&mut reporter, step.as_ref(), &mut ctx) {
                log.warn("step.failed", &format!("{}: {error}", step.name()));
                ctx.fail(error);
                ctx.set_duration(started.elapsed());
                return ctx;
            }

            if let Some((declared, key)) = &key {
                cache.persist(&ctx, key, declared);
            }
        }

        ctx.set_duration(started.elapsed());

        if let Some(invalidates) = &invalidates {
            let tags = invalidates(&mut ctx);
            if !tags.is_empty() {
                let report = invalidate(&store, &tags);
                log.info(
                    "cache.invalidated",
                    &format!("tags={} removed={}", tags.join(","), report.removed),
                );
                for failure in &report.failures {
                    log.warn("cache.invalidate_failed", failure);
                }
            }
        }

        ctx
    }

    fn action<F>(mut self, name: &'static str, action: F) -> Self
    where
        F: Fn(&mut Context<C>) -> Result<(), StepError> + Send + Sync + 'static,
    {
        self.steps.push(Box::new(ActionStep::new(name, action)));
        self
    }
}

fn run_step<C, W>(
    reporter: &mut ProgressReporter<W>,
    step: &dyn StepRunner<C>,
    ctx: &mut Context<C>,
) -> Result<(), StepError>
where
    C: Send,
    W: Write,
{
    if step.message().is_empty() || step.is_silent() {
        let progress = ProgressSender::detached();
        return panic::catch_unwind(AssertUnwindSafe(|| step.run(ctx, &progress)))
            .map_err(|payload| StepError::WorkerPanicked(panic_message(payload.as_ref())))?;
    }

    reporter
        .run(step.message(), |progress| step.run(ctx, &progress))
        .map_err(|ProgressError::WorkerPanicked(reason)| StepError::WorkerPanicked(reason))?
}

struct CacheGate<'a> {
    store: &'a CacheStore,
    log: &'a EventLog,
}

impl CacheGate<'_> {
    fn restore<C>(&self, ctx: &mut Context<C>, key: &EffectiveKey) -> bool {
        let bytes = match self.store.get(Namespace::Cache, &key.storage) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return false,
            Err(err) => {
                self.log
                    .warn("cache.read_failed", &format!("{}: {err}", key.source));
                return false;
            }
        };

        let entry = match CachedResult::decode(&bytes) {
            Ok(entry) => entry,
            Err(err) => {
                self.log
                    .warn("cache.read_failed", &format!("{}: {err}", key.source));
                return false;
            }
        };
        if !entry.is_fresh(DEFAULT_CACHE_TTL, Utc::now()) {
            return false;
        }
        let Value::Object(data) = entry.data else {
            return false;
        };

        ctx.restore(data);
        self.log.info("cache.hit", &key.source);
        true
    }

    fn persist<C>(&self, ctx: &Context<C>, key: &EffectiveKey, declared: &str) {
        match self.try_persist(ctx, key, declared) {
            Ok(()) => self.log.info("cache.stored", &key.source),
            Err(err) => self
                .log
                .warn("cache.write_failed", &format!("{}: {err}", key.source)),
        }
    }

    fn try_persist<C>(
        &self,
        ctx: &Context<C>,
        key: &EffectiveKey,
        declared: &str,
    ) -> Result<(), StoreError> {
        let data = ctx
            .snapshot()
            .map_err(|source| StoreError::Encode { source })?;
        let bytes = CachedResult::new(data, Utc::now())
            .encode()
            .map_err(|source| StoreError::Encode { source })?;
        self.store
            .put_cache_entry(&key.storage, &key.source, &bytes)?;
        self.store.add_tags(&key.storage, &[declared.to_string()])
    }
}
