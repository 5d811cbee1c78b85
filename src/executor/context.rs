use super::{Slot, StepError};
use crate::pagination::PageWindow;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use std::time::Duration;

trait LiveValue: Any + Send {
    fn to_json(&self) -> Result<Value, serde_json::Error>;
    fn as_any(&self) -> &dyn Any;
}

impl<T> LiveValue for T
where
    T: Serialize + Send + 'static,
{
    fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

enum SlotValue {
    Live(Box<dyn LiveValue>),
    Raw(Value),
}

pub struct Context<C> {
    client: Option<C>,
    pub args: Vec<String>,
    pub account_id: Option<String>,
    pub pagination: PageWindow,
    error: Option<StepError>,
    duration: Duration,
    restored_from_cache: bool,
    data: HashMap<String, SlotValue>,
}

impl<C> Context<C> {
    pub fn new(args: Vec<String>) -> Self {
        Self {
            client: None,
            args,
            account_id: None,
            pagination: PageWindow::default(),
            error: None,
            duration: Duration::ZERO,
            restored_from_cache: false,
            data: HashMap::new(),
        }
    }

    pub fn client(&self) -> Result<&C, StepError> {
        self.client.as_ref().ok_or(StepError::MissingClient)
    }

    pub fn set_client(&mut self, client: C) {
        self.client = Some(client);
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn account_id(&self) -> Result<&str, StepError> {
        self.account_id.as_deref().ok_or(StepError::MissingAccount)
    }

    pub fn error(&self) -> Option<&StepError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<StepError> {
        self.error.take()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn restored_from_cache(&self) -> bool {
        self.restored_from_cache
    }

    pub fn set<T>(&mut self, slot: &Slot<T>, value: T)
    where
        T: Serialize + Send + 'static,
    {
        self.data
            .insert(slot.name().to_string(), SlotValue::Live(Box::new(value)));
    }

    pub fn get<T>(&mut self, slot: &Slot<T>) -> Option<&T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let entry = self.data.get_mut(slot.name())?;
        let decoded = match &*entry {
            SlotValue::Raw(raw) => Some(serde_json::from_value::<T>(raw.clone()).ok()?),
            SlotValue::Live(_) => None,
        };
        if let Some(value) = decoded {
            *entry = SlotValue::Live(Box::new(value));
        }

        match &*entry {
            SlotValue::Live(value) => (**value).as_any().downcast_ref::<T>(),
            SlotValue::Raw(_) => None,
        }
    }

    pub fn get_cloned<T>(&mut self, slot: &Slot<T>) -> Option<T>
    where
        T: Clone + Serialize + DeserializeOwned + Send + 'static,
    {
        self.get(slot).cloned()
    }

    pub fn require<T>(&mut self, slot: &Slot<T>) -> Result<&T, StepError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        self.get(slot).ok_or_else(|| StepError::MissingSlot {
            slot: slot.name().to_string(),
        })
    }

    pub fn has<T>(&self, slot: &Slot<T>) -> bool {
        self.data.contains_key(slot.name())
    }

    pub(crate) fn snapshot(&self) -> Result<Value, serde_json::Error> {
        let mut map = Map::new();
        for (name, value) in &self.data {
            let json = match value {
                SlotValue::Live(live) => (**live).to_json()?,
                SlotValue::Raw(raw) => raw.clone(),
            };
            map.insert(name.clone(), json);
        }
        Ok(Value::Object(map))
    }

    pub(crate) fn restore(&mut self, data: Map<String, Value>) {
        for (name, value) in data {
            self.data.insert(name, SlotValue::Raw(value));
        }
        self.restored_from_cache = true;
    }

    pub(crate) fn fail(&mut self, error: StepError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub(crate) fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Zone {
        id: String,
        name: String,
    }

    const ZONES: Slot<Vec<Zone>> = Slot::new("zones");
    const COUNT: Slot<u32> = Slot::new("count");

    fn zone(id: &str) -> Zone {
        Zone {
            id: id.to_string(),
            name: format!("{id}.example"),
        }
    }

    #[test]
    fn live_values_round_trip_by_type() {
        let mut ctx: Context<()> = Context::new(Vec::new());
        ctx.set(&ZONES, vec![zone("a")]);

        assert!(ctx.has(&ZONES));
        assert_eq!(ctx.get(&ZONES), Some(&vec![zone("a")]));
        assert_eq!(ctx.get(&COUNT), None);
    }

    #[test]
    fn restored_json_decodes_on_first_read() {
        let mut source: Context<()> = Context::new(Vec::new());
        source.set(&ZONES, vec![zone("a"), zone("b")]);
        source.set(&COUNT, 2);
        let Value::Object(snapshot) = source.snapshot().expect("snapshot") else {
            panic!("snapshot must be an object");
        };

        let mut restored: Context<()> = Context::new(Vec::new());
        restored.restore(snapshot);
        assert!(restored.restored_from_cache());
        assert_eq!(restored.get_cloned(&COUNT), Some(2));
        assert_eq!(restored.get(&ZONES).map(Vec::len), Some(2));
    }

    #[test]
    fn mismatched_cached_json_reads_as_missing() {
        let mut ctx: Context<()> = Context::new(Vec::new());
        let mut data = Map::new();
        data.insert("count".to_string(), Value::String("many".to_string()));
        ctx.restore(data);

        assert!(ctx.has(&COUNT));
        assert_eq!(ctx.get(&COUNT), None);
        assert!(matches!(
            ctx.require(&COUNT),
            Err(StepError::MissingSlot { slot }) if slot == "count"
        ));
    }

    #[test]
    fn first_failure_wins() {
        let mut ctx: Context<()> = Context::new(Vec::new());
        ctx.fail(StepError::Aborted);
        ctx.fail(StepError::Failed("later".to_string()));
        assert!(matches!(ctx.error(), Some(StepError::Aborted)));
    }

    #[test]
    fn missing_client_and_account_are_step_errors() {
        let ctx: Context<String> = Context::new(vec!["zone.example".to_string()]);
        assert!(matches!(ctx.client(), Err(StepError::MissingClient)));
        assert!(matches!(ctx.account_id(), Err(StepError::MissingAccount)));
        assert_eq!(ctx.arg(0), Some("zone.example"));
        assert_eq!(ctx.arg(1), None);
    }
}
