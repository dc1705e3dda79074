//! The registry: command dispatch over an attribute store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::command::{Invocation, RenderMode, Verb};
use crate::constants::{
    DEFAULT_CARRIER, DEFAULT_HOST, DEFAULT_SOCKET, MCAST_CARRIER, TOPIC_CARRIER, WILDCARD, keys,
};
use crate::reply::{Outcome, Response};
use crate::{
    Activity, Attribute, AttributeStore, ChangeSubscriber, Command, Contact, ContactAllocator,
    ContactRequest, Context, Event, NameLookup, PortName, Registration, RegistryConfig,
    RegistryError, StoreError,
};

/// Locked access to the store with an open transaction.
///
/// Ends the transaction when dropped unless [`commit`](Self::commit) ran.
struct Session<'a, S: AttributeStore> {
    guard: MutexGuard<'a, S>,
    committed: bool,
}

impl<S: AttributeStore> Session<'_, S> {
    fn store(&mut self) -> &mut S {
        &mut self.guard
    }

    fn commit(mut self) -> Result<(), StoreError> {
        self.committed = true;
        self.guard.end_transaction()
    }
}

impl<S: AttributeStore> Drop for Session<'_, S> {
    fn drop(&mut self) {
        if !self.committed
            && let Err(e) = self.guard.end_transaction()
        {
            warn!(error = %e, "failed to end abandoned transaction");
        }
    }
}

/// Per-command state threaded through the handlers.
struct RequestContext<'r> {
    remote: Option<&'r str>,
    events: Vec<Event>,
    unregistering: Vec<String>,
}

impl<'r> RequestContext<'r> {
    const fn new(remote: Option<&'r str>) -> Self {
        Self {
            remote,
            events: Vec::new(),
            unregistering: Vec::new(),
        }
    }
}

/// Name registry over a transactional attribute store.
///
/// Every command runs as one transaction behind a single registry-wide
/// lock, so command execution is linearizable. The allocator, subscriber,
/// and delegate are shared with the caller.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use port_registry::{Command, MemoryStore, PortAllocator, Registry, RegistryConfig};
///
/// let registry = Registry::new(
///     MemoryStore::new(),
///     Arc::new(PortAllocator::with_defaults()),
///     RegistryConfig::new(),
/// );
///
/// let command = Command::parse("register /cam tcp 192.168.1.5 10002").unwrap();
/// let response = registry.apply(&command, None).unwrap();
/// assert_eq!(
///     response.reply().to_string(),
///     "old (registration name /cam ip 192.168.1.5 port 10002 type tcp)"
/// );
/// assert_eq!(response.events()[0].to_string(), "add /cam");
/// ```
pub struct Registry<S: AttributeStore> {
    store: Mutex<S>,
    allocator: Arc<dyn ContactAllocator>,
    subscriber: Option<Arc<dyn ChangeSubscriber>>,
    delegate: Option<Arc<dyn NameLookup>>,
    config: RegistryConfig,
    gone_public: AtomicBool,
    last_register: Mutex<String>,
}

impl<S: AttributeStore> Registry<S> {
    /// Creates a registry that owns `store`.
    #[must_use]
    pub fn new(store: S, allocator: Arc<dyn ContactAllocator>, config: RegistryConfig) -> Self {
        Self {
            store: Mutex::new(store),
            allocator,
            subscriber: None,
            delegate: None,
            config,
            gone_public: AtomicBool::new(false),
            last_register: Mutex::new(String::new()),
        }
    }

    /// Attaches a subscriber for registration activity.
    #[must_use]
    pub fn with_subscriber(mut self, subscriber: Arc<dyn ChangeSubscriber>) -> Self {
        self.subscriber = Some(subscriber);
        self
    }

    /// Attaches a fallback resolver for names this registry does not know.
    ///
    /// The delegate is consulted under this registry's lock, so it must not
    /// be this registry.
    #[must_use]
    pub fn with_delegate(mut self, delegate: Arc<dyn NameLookup>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Starts announcing activity to the subscriber.
    pub fn go_public(&self) {
        self.gone_public.store(true, Ordering::Release);
    }

    /// Returns true once [`go_public`](Self::go_public) has been called.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.gone_public.load(Ordering::Acquire)
    }

    /// Runs `f` with exclusive access to the store, outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockPoisoned` if a previous command panicked.
    pub fn access_store<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, RegistryError> {
        let mut guard = self.store.lock().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(f(&mut guard))
    }

    /// Applies one command on behalf of `remote` (the caller's host, if
    /// known).
    ///
    /// Unknown names, malformed commands, and allocation failures are
    /// reported in the response, never as `Err`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store fails or the lock is poisoned.
    pub fn apply(&self, command: &Command, remote: Option<&str>) -> Result<Response, RegistryError> {
        let invocation = command.interpret();
        self.log_command(command, invocation.verb());
        self.run(invocation, remote)
    }

    /// Registers a name.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store fails or the lock is poisoned.
    pub fn register(
        &self,
        registration: Registration,
        remote: Option<&str>,
    ) -> Result<Response, RegistryError> {
        self.run(
            Invocation::new(Verb::Register(registration), RenderMode::Legacy),
            remote,
        )
    }

    /// Unregisters a name and everything it owns.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store fails or the lock is poisoned.
    pub fn unregister(&self, name: &str) -> Result<Response, RegistryError> {
        self.run(
            Invocation::new(
                Verb::Unregister {
                    name: name.to_string(),
                },
                RenderMode::Legacy,
            ),
            None,
        )
    }

    /// Replaces the values of a property.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store fails or the lock is poisoned.
    pub fn set(&self, name: &str, key: &str, values: &[&str]) -> Result<Response, RegistryError> {
        self.run(
            Invocation::new(
                Verb::Set {
                    name: name.to_string(),
                    key: key.to_string(),
                    values: values.iter().map(|v| (*v).to_string()).collect(),
                },
                RenderMode::Legacy,
            ),
            None,
        )
    }

    /// Resolves a name, falling back to the delegate.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store fails or the lock is poisoned.
    pub fn query(&self, name: &str) -> Result<Option<Contact>, RegistryError> {
        self.read(|registry, store| registry.do_query(store, name))
    }

    /// Resolves a name, accepting concrete `carrier://host:port` addresses
    /// as-is without consulting the store.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store fails or the lock is poisoned.
    pub fn resolve(&self, name: &str) -> Result<Option<Contact>, RegistryError> {
        if let Some(contact) = Contact::parse_address(name) {
            return Ok(Some(contact));
        }
        self.query(name)
    }

    /// Lists registrations, optionally restricted to a name prefix.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store fails or the lock is poisoned.
    pub fn list(&self, prefix: Option<&str>) -> Result<Vec<Contact>, RegistryError> {
        self.read(|_, store| do_list(store, prefix))
    }

    /// Lists registrations marked as live managed processes.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store fails or the lock is poisoned.
    pub fn runners(&self) -> Result<Vec<Contact>, RegistryError> {
        self.read(|_, store| do_runners(store))
    }

    /// Returns the values of a property, or `None` if the name is unknown.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store fails or the lock is poisoned.
    pub fn get(&self, name: &str, key: &str) -> Result<Option<Vec<String>>, RegistryError> {
        self.read(|_, store| {
            let Some(ctx) = record(store, name)? else {
                return Ok(None);
            };
            property(store, key, ctx).map(Some)
        })
    }

    /// Returns whether a property holds `value`, or `None` if the name is
    /// unknown.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store fails or the lock is poisoned.
    pub fn check(&self, name: &str, key: &str, value: &str) -> Result<Option<bool>, RegistryError> {
        Ok(self
            .get(name, key)?
            .map(|values| values.iter().any(|v| v == value)))
    }

    fn lock(&self) -> Result<Session<'_, S>, RegistryError> {
        let mut guard = self.store.lock().map_err(|_| RegistryError::LockPoisoned)?;
        guard.reset();
        guard.begin_transaction()?;
        Ok(Session {
            guard,
            committed: false,
        })
    }

    fn read<R>(
        &self,
        f: impl FnOnce(&Self, &mut S) -> Result<R, StoreError>,
    ) -> Result<R, RegistryError> {
        let mut session = self.lock()?;
        let result = f(self, session.store())?;
        session.commit()?;
        Ok(result)
    }

    fn run(&self, invocation: Invocation, remote: Option<&str>) -> Result<Response, RegistryError> {
        let (verb, mode) = invocation.into_parts();
        let mut session = self.lock()?;
        let mut state = RequestContext::new(remote);
        let outcome = self.dispatch(session.store(), &mut state, verb)?;
        session.commit()?;
        let succeeded = outcome.succeeded();
        Ok(Response::new(
            outcome.render(mode),
            state.events,
            mode,
            succeeded,
        ))
    }

    fn log_command(&self, command: &Command, verb: &Verb) {
        let mut last_register = self
            .last_register
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut marker = " * ";
        match verb {
            Verb::Register(registration) => registration.name().clone_into(&mut *last_register),
            Verb::Set { name, .. } => {
                if *name == *last_register {
                    marker = "   + ";
                }
            }
            _ => last_register.clear(),
        }
        if !self.config.silent {
            info!("{marker}{command}");
        }
    }

    fn announce(&self, name: &str, activity: Activity) {
        if let Some(subscriber) = &self.subscriber
            && self.is_public()
        {
            subscriber.welcome(name, activity);
        }
    }

    fn dispatch(
        &self,
        store: &mut S,
        state: &mut RequestContext<'_>,
        verb: Verb,
    ) -> Result<Outcome, StoreError> {
        match verb {
            Verb::Register(registration) => self.do_register(store, state, &registration),
            Verb::Unregister { name } => self.do_unregister(store, state, &name),
            Verb::Query { name } => self.do_query(store, &name).map(Outcome::Resolved),
            Verb::List { prefix } => do_list(store, prefix.as_deref()).map(Outcome::Listing),
            Verb::Runners => do_runners(store).map(Outcome::Listing),
            Verb::Set { name, key, values } => {
                let Some(ctx) = record(store, &name)? else {
                    return Ok(Outcome::NotKnown);
                };
                store.remove_matching(&Attribute::any(key.as_str()), Some(ctx))?;
                for value in values {
                    store.insert(Attribute::new(key.as_str(), value), Some(ctx))?;
                }
                let values = property(store, &key, ctx)?;
                Ok(Outcome::Property { name, key, values })
            }
            Verb::Get { name, key } => {
                let Some(ctx) = record(store, &name)? else {
                    return Ok(Outcome::NotKnown);
                };
                let values = property(store, &key, ctx)?;
                Ok(Outcome::Property { name, key, values })
            }
            Verb::Check { name, key, value } => {
                let Some(ctx) = record(store, &name)? else {
                    return Ok(Outcome::NotKnown);
                };
                let present = property(store, &key, ctx)?.contains(&value);
                Ok(Outcome::Presence {
                    name,
                    key,
                    value,
                    present,
                })
            }
            Verb::Route { from, to } => {
                let address = format!("tcp:/{to}");
                Ok(Outcome::Route { from, to, address })
            }
            Verb::Gc => Ok(Outcome::Collected),
            Verb::Help => Ok(Outcome::Help),
            Verb::Malformed { verb, reason } => {
                debug!(%verb, reason, "malformed command");
                Ok(Outcome::Unrecognized)
            }
            Verb::Unrecognized { verb } => {
                debug!(%verb, "unrecognized command");
                Ok(Outcome::Unrecognized)
            }
        }
    }

    fn do_register(
        &self,
        store: &mut S,
        state: &mut RequestContext<'_>,
        registration: &Registration,
    ) -> Result<Outcome, StoreError> {
        let name = registration.name();
        if name == WILDCARD {
            debug!("wildcard is not a port name");
            return Ok(Outcome::Unrecognized);
        }
        if record(store, name)?.is_some() {
            self.do_unregister(store, state, name)?;
        }

        let carrier = registration.carrier().unwrap_or(DEFAULT_CARRIER);
        let server = &self.config.server_contact;
        let mut port = registration.port();
        let host = match carrier {
            MCAST_CARRIER => registration.host().map(str::to_string),
            TOPIC_CARRIER => {
                port = port.or(Some(server.port()));
                Some(registration.host().unwrap_or(server.host()).to_string())
            }
            _ => Some(
                registration
                    .host()
                    .or(state.remote)
                    .unwrap_or(DEFAULT_HOST)
                    .to_string(),
            ),
        };

        let mut request = ContactRequest::new(name)
            .with_carrier(carrier)
            .with_optional_host(host)
            .with_port(port.unwrap_or(0));

        if request.wants_generated_name() {
            let suffix = name.strip_prefix('=').unwrap_or_default();
            match self.allocator.complete_name(&request) {
                Ok(completed) => {
                    let generated = format!("{}{suffix}", completed.name());
                    request = completed.with_name(generated);
                }
                Err(e) => {
                    warn!(%name, error = %e, "name allocation failed");
                    return Ok(Outcome::AllocationFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }

        let contact = match self.allocator.complete_socket(&request) {
            Ok(contact) => contact,
            Err(e) => {
                warn!(name = request.name(), error = %e, "socket allocation failed");
                return Ok(Outcome::AllocationFailed {
                    reason: e.to_string(),
                });
            }
        };

        let rid = store.insert(Attribute::new(keys::PORT, contact.name()), None)?;
        let scope = Some(Context::of(rid));
        store.update(Attribute::new(keys::CARRIER, contact.carrier()), scope)?;
        store.update(Attribute::new(keys::HOST, contact.host()), scope)?;
        store.update(Attribute::new(keys::SOCKET, contact.port().to_string()), scope)?;
        if let Some(type_name) = registration.type_name() {
            store.update(Attribute::new(keys::TYPE, type_name), scope)?;
        }

        if contact.carrier() != MCAST_CARRIER {
            state.events.push(Event::add(contact.name()));
            self.announce(contact.name(), Activity::Added);
        }
        registered(store, contact.name()).map(Outcome::Resolved)
    }

    fn do_unregister(
        &self,
        store: &mut S,
        state: &mut RequestContext<'_>,
        name: &str,
    ) -> Result<Outcome, StoreError> {
        if state.unregistering.iter().any(|n| n == name) {
            return Ok(Outcome::Resolved(None));
        }
        state.unregistering.push(name.to_string());

        self.announce(name, Activity::Removed);
        if let Some(ctx) = record(store, name)? {
            let contact = contact_of(store, name, ctx, None)?;
            self.allocator.free_resources(&contact);

            let owned = store.query(&Attribute::any(keys::OWNS), Some(ctx))?;
            for child in owned {
                self.do_unregister(store, state, child.value())?;
            }
            store.remove_matching(&Attribute::everything(), Some(ctx))?;
            store.remove_matching(&Attribute::new(keys::PORT, name), None)?;

            if contact.carrier() != MCAST_CARRIER {
                state.events.push(Event::del(name));
            }
        }

        registered(store, name).map(Outcome::Resolved)
    }

    /// Resolves a possibly decorated name, asking the delegate on a miss.
    fn do_query(&self, store: &mut S, name: &str) -> Result<Option<Contact>, StoreError> {
        store.reset();
        let parsed = PortName::parse(name);
        let Some(ctx) = record(store, parsed.name())? else {
            if let Some(delegate) = &self.delegate {
                debug!(name = parsed.name(), "consulting delegate");
                return Ok(delegate.lookup(parsed.name()));
            }
            return Ok(None);
        };
        contact_of(store, parsed.name(), ctx, parsed.network_choice()).map(Some)
    }
}

impl<S: AttributeStore> NameLookup for Registry<S> {
    fn lookup(&self, name: &str) -> Option<Contact> {
        match self.resolve(name) {
            Ok(contact) => contact,
            Err(e) => {
                warn!(%name, error = %e, "lookup failed");
                None
            }
        }
    }
}

fn do_list<S: AttributeStore>(
    store: &mut S,
    prefix: Option<&str>,
) -> Result<Vec<Contact>, StoreError> {
    let names = store.query(&Attribute::any(keys::PORT), None)?;
    let mut contacts = Vec::new();
    for name in names {
        if prefix.is_some_and(|prefix| !in_namespace(name.value(), prefix)) {
            continue;
        }
        if let Some(contact) = registered(store, name.value())? {
            contacts.push(contact);
        }
    }
    Ok(contacts)
}

fn do_runners<S: AttributeStore>(store: &mut S) -> Result<Vec<Contact>, StoreError> {
    let names = store.query(&Attribute::any(keys::PORT), None)?;
    let mut contacts = Vec::new();
    for name in names {
        let Some(ctx) = record(store, name.value())? else {
            continue;
        };
        if store
            .find(&Attribute::new(keys::RUNNER, "true"), Some(ctx))?
            .is_none()
        {
            continue;
        }
        contacts.push(contact_of(store, name.value(), ctx, None)?);
    }
    Ok(contacts)
}

/// Returns the scope of the record registered as exactly `name`.
///
/// The wildcard never names a record.
fn record<S: AttributeStore>(store: &mut S, name: &str) -> Result<Option<Context>, StoreError> {
    if name == WILDCARD {
        return Ok(None);
    }
    Ok(store
        .find(&Attribute::new(keys::PORT, name), None)?
        .map(Context::of))
}

/// Resolves the record registered as exactly `name`, without decorations.
fn registered<S: AttributeStore>(
    store: &mut S,
    name: &str,
) -> Result<Option<Contact>, StoreError> {
    store.reset();
    match record(store, name)? {
        Some(ctx) => contact_of(store, name, ctx, None).map(Some),
        None => Ok(None),
    }
}

/// Builds the contact of the record at `ctx`.
///
/// With a network choice, the first `ips` value starting with it wins over
/// the stored host.
fn contact_of<S: AttributeStore>(
    store: &mut S,
    name: &str,
    ctx: Context,
    network_choice: Option<&str>,
) -> Result<Contact, StoreError> {
    let mut host = None;
    if let Some(choice) = network_choice {
        host = store
            .query(&Attribute::any(keys::IPS), Some(ctx))?
            .into_iter()
            .map(Attribute::into_value)
            .find(|ip| ip.starts_with(choice));
    }
    if host.is_none() {
        host = first_value(store, keys::HOST, ctx)?;
    }
    let host = host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = first_value(store, keys::SOCKET, ctx)?
        .and_then(|socket| socket.parse().ok())
        .unwrap_or(DEFAULT_SOCKET);
    let carrier =
        first_value(store, keys::CARRIER, ctx)?.unwrap_or_else(|| DEFAULT_CARRIER.to_string());

    let mut contact = Contact::new(name, carrier, host, port);
    if let Some(type_name) = first_value(store, keys::TYPE, ctx)?
        && type_name != WILDCARD
    {
        contact = contact.with_type_name(type_name);
    }
    Ok(contact)
}

fn first_value<S: AttributeStore>(
    store: &mut S,
    key: &str,
    ctx: Context,
) -> Result<Option<String>, StoreError> {
    Ok(store
        .query(&Attribute::any(key), Some(ctx))?
        .into_iter()
        .next()
        .map(Attribute::into_value))
}

fn property<S: AttributeStore>(
    store: &mut S,
    key: &str,
    ctx: Context,
) -> Result<Vec<String>, StoreError> {
    Ok(store
        .query(&Attribute::any(key), Some(ctx))?
        .into_iter()
        .map(Attribute::into_value)
        .collect())
}

/// True if `name` is `prefix` itself or lies under it.
fn in_namespace(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'))
}
