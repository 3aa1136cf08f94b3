//! Constructor and call-argument autowiring.
//!
//! # Responsibilities
//! - Describe the parameters a constructor or handler requires
//! - Walk those parameters and produce an ordered [`Args`] list
//! - Recurse into constructible dependencies that have no binding
//!
//! # Design Decisions
//! - Types opt in through [`Injectable`]; there is no runtime reflection
//! - Optional parameters are never supplied
//! - Scalar parameters cannot be produced by the container; the policy decides
//!   whether they are skipped or reported

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use super::binding::Instance;
use super::container::{downcast, Container, ContainerError, ResolutionGuard};
use crate::http::Request;

/// A type the container can construct from declared dependencies.
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Registry key of the type.
    fn type_key() -> &'static str {
        type_name::<Self>()
    }

    /// Constructor parameters in declaration order.
    fn parameters() -> Vec<Parameter> {
        Vec::new()
    }

    /// Build the value from autowired arguments.
    fn construct(args: &mut Args) -> Result<Self, ContainerError>;
}

/// Identifier used for an interface-style (trait object) binding.
pub fn key_of<T: ?Sized + 'static>() -> &'static str {
    type_name::<T>()
}

/// What to do with parameters the container cannot produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutowirePolicy {
    /// Omit the parameter from the argument list.
    #[default]
    Lenient,
    /// Fail with [`ContainerError::UnresolvedDependency`].
    Strict,
}

impl AutowirePolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            AutowirePolicy::Strict
        } else {
            AutowirePolicy::Lenient
        }
    }
}

/// The declared type of a parameter.
#[derive(Clone)]
pub enum ParamKind {
    /// A service resolved from the container. `descriptor` is present when the
    /// type itself is constructible.
    Service {
        id: String,
        descriptor: Option<TypeDescriptor>,
    },
    /// The request currently being dispatched.
    Request,
    /// A builtin or untyped value.
    Scalar,
}

impl fmt::Debug for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Service { id, descriptor } => f
                .debug_struct("Service")
                .field("id", id)
                .field("constructible", &descriptor.is_some())
                .finish(),
            ParamKind::Request => f.write_str("Request"),
            ParamKind::Scalar => f.write_str("Scalar"),
        }
    }
}

/// One declared parameter of a constructor or handler.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: &'static str,
    kind: ParamKind,
    optional: bool,
}

impl Parameter {
    /// A parameter of a constructible type.
    pub fn service<T: Injectable>(name: &'static str) -> Self {
        Self::new(
            name,
            ParamKind::Service {
                id: T::type_key().to_string(),
                descriptor: Some(TypeDescriptor::of::<T>()),
            },
        )
    }

    /// A parameter satisfied only by a binding registered under `id`.
    pub fn bound(name: &'static str, id: impl Into<String>) -> Self {
        Self::new(
            name,
            ParamKind::Service {
                id: id.into(),
                descriptor: None,
            },
        )
    }

    /// A parameter typed by an interface (trait object); requires a binding.
    pub fn interface<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self::bound(name, key_of::<T>())
    }

    /// Receives the current request.
    pub fn request(name: &'static str) -> Self {
        Self::new(name, ParamKind::Request)
    }

    /// A builtin value the container cannot produce.
    pub fn scalar(name: &'static str) -> Self {
        Self::new(name, ParamKind::Scalar)
    }

    /// Mark the parameter as having a default value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn new(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            optional: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Type-erased constructor information for an [`Injectable`] type.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    key: &'static str,
    parameters: fn() -> Vec<Parameter>,
    construct: fn(&mut Args) -> Result<Instance, ContainerError>,
}

impl TypeDescriptor {
    pub fn of<T: Injectable>() -> Self {
        Self {
            key: T::type_key(),
            parameters: T::parameters,
            construct: construct_erased::<T>,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn parameters(&self) -> Vec<Parameter> {
        (self.parameters)()
    }

    /// Number of parameters without a default value.
    pub fn required_parameters(&self) -> usize {
        self.parameters().iter().filter(|p| !p.is_optional()).count()
    }

    pub(crate) fn construct(&self, args: &mut Args) -> Result<Instance, ContainerError> {
        (self.construct)(args)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor").field(&self.key).finish()
    }
}

fn construct_erased<T: Injectable>(args: &mut Args) -> Result<Instance, ContainerError> {
    T::construct(args).map(|value| Arc::new(value) as Instance)
}

/// Ordered arguments produced by autowiring, followed by path captures.
#[derive(Default, Clone)]
pub struct Args {
    values: Vec<(&'static str, Instance)>,
    captures: Vec<Option<String>>,
    cursor: usize,
}

impl Args {
    pub(crate) fn push(&mut self, name: &'static str, instance: Instance) {
        self.values.push((name, instance));
    }

    /// Append captured path parameters after the resolved services.
    pub fn with_captures(mut self, captures: Vec<Option<String>>) -> Self {
        self.captures.extend(captures);
        self
    }

    /// Look up a resolved argument by parameter name.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ContainerError> {
        let instance = self
            .values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, instance)| Arc::clone(instance))
            .ok_or_else(|| ContainerError::UnresolvedDependency(name.to_string()))?;
        downcast(name, instance)
    }

    /// Take the next resolved argument in declaration order.
    pub fn next_service<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>, ContainerError> {
        let (name, instance) = self
            .values
            .get(self.cursor)
            .map(|(n, i)| (*n, Arc::clone(i)))
            .ok_or_else(|| {
                ContainerError::UnresolvedDependency(format!("argument #{}", self.cursor))
            })?;
        self.cursor += 1;
        downcast(name, instance)
    }

    /// Captured path parameter at `index`; `None` if absent or unmatched.
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).and_then(|c| c.as_deref())
    }

    pub fn captures(&self) -> &[Option<String>] {
        &self.captures
    }

    /// Names of the resolved arguments, in order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.values.len() + self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("values", &self.names().collect::<Vec<_>>())
            .field("captures", &self.captures)
            .finish()
    }
}

impl Container {
    /// Resolve the required constructor parameters of `T`.
    pub fn autowire_constructor_args<T: Injectable>(&self) -> Result<Args, ContainerError> {
        self.autowire(&T::parameters(), None)
    }

    /// Resolve the required parameters of a handler.
    pub fn autowire_call_args(
        &self,
        parameters: &[Parameter],
        request: Option<&Arc<Request>>,
    ) -> Result<Args, ContainerError> {
        self.autowire(parameters, request)
    }

    /// Autowire and construct `T`, ignoring any binding for it.
    pub fn build<T: Injectable>(&self) -> Result<Arc<T>, ContainerError> {
        let instance = self.build_descriptor(&TypeDescriptor::of::<T>())?;
        downcast(T::type_key(), instance)
    }

    pub(crate) fn build_descriptor(
        &self,
        descriptor: &TypeDescriptor,
    ) -> Result<Instance, ContainerError> {
        let _guard = ResolutionGuard::enter_build(descriptor.key())?;
        let mut args = self.autowire(&descriptor.parameters(), None)?;
        descriptor.construct(&mut args)
    }

    fn autowire(
        &self,
        parameters: &[Parameter],
        request: Option<&Arc<Request>>,
    ) -> Result<Args, ContainerError> {
        let mut args = Args::default();
        for parameter in parameters.iter().filter(|p| !p.is_optional()) {
            match parameter.kind() {
                ParamKind::Service { id, descriptor } => {
                    let instance = match descriptor {
                        Some(descriptor) if !self.is_bound(id) => {
                            if descriptor.required_parameters() == 0 {
                                descriptor.construct(&mut Args::default())?
                            } else {
                                self.build_descriptor(descriptor)?
                            }
                        }
                        _ => self.resolve(id)?,
                    };
                    args.push(parameter.name(), instance);
                }
                ParamKind::Request => {
                    let request = request.ok_or_else(|| {
                        ContainerError::UnresolvedDependency(parameter.name().to_string())
                    })?;
                    args.push(parameter.name(), Arc::clone(request) as Instance);
                }
                ParamKind::Scalar => match self.policy() {
                    AutowirePolicy::Lenient => {
                        tracing::trace!(parameter = parameter.name(), "Skipping scalar parameter");
                    }
                    AutowirePolicy::Strict => {
                        return Err(ContainerError::UnresolvedDependency(
                            parameter.name().to_string(),
                        ));
                    }
                },
            }
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Clock;

    impl Injectable for Clock {
        fn construct(_: &mut Args) -> Result<Self, ContainerError> {
            Ok(Clock)
        }
    }

    #[derive(Debug)]
    struct Mailer {
        clock: Arc<Clock>,
    }

    impl Injectable for Mailer {
        fn parameters() -> Vec<Parameter> {
            vec![Parameter::service::<Clock>("clock")]
        }

        fn construct(args: &mut Args) -> Result<Self, ContainerError> {
            Ok(Mailer {
                clock: args.get("clock")?,
            })
        }
    }

    #[derive(Debug)]
    struct Signup {
        mailer: Arc<Mailer>,
    }

    impl Injectable for Signup {
        fn parameters() -> Vec<Parameter> {
            vec![
                Parameter::service::<Mailer>("mailer"),
                Parameter::scalar("retries"),
                Parameter::service::<Clock>("clock").optional(),
            ]
        }

        fn construct(args: &mut Args) -> Result<Self, ContainerError> {
            Ok(Signup {
                mailer: args.next_service()?,
            })
        }
    }

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn test_constructs_dependency_graph_recursively() {
        let container = Container::new();
        let signup = container.build::<Signup>().unwrap();
        let _ = &signup.mailer.clock;
    }

    #[test]
    fn test_skips_scalar_and_optional_parameters() {
        let container = Container::new();
        let args = container.autowire_constructor_args::<Signup>().unwrap();
        assert_eq!(args.names().collect::<Vec<_>>(), vec!["mailer"]);
    }

    #[test]
    fn test_strict_policy_rejects_scalar_parameters() {
        let container = Container::with_policy(AutowirePolicy::Strict);
        let err = container.autowire_constructor_args::<Signup>().unwrap_err();
        assert!(matches!(err, ContainerError::UnresolvedDependency(ref id) if id == "retries"));
    }

    #[test]
    fn test_binding_takes_precedence_over_direct_construction() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);
        let container = Container::new();
        container.bind_singleton(Clock::type_key(), |_| {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Ok(Clock)
        });

        container.build::<Mailer>().unwrap();
        container.build::<Mailer>().unwrap();
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_interface_parameter_requires_binding() {
        let container = Container::new();
        let params = [Parameter::interface::<dyn Greeter>("greeter")];

        let err = container.autowire_call_args(&params, None).unwrap_err();
        assert!(matches!(err, ContainerError::UnresolvedDependency(_)));

        container.bind(key_of::<dyn Greeter>(), |_| {
            Ok(Arc::new(English) as Arc<dyn Greeter>)
        });
        let args = container.autowire_call_args(&params, None).unwrap();
        let greeter = args.get::<Arc<dyn Greeter>>("greeter").unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_request_parameter_receives_current_request() {
        let container = Container::new();
        let request = Arc::new(Request::new(Method::Get, "/users?page=2"));
        let args = container
            .autowire_call_args(&[Parameter::request("request")], Some(&request))
            .unwrap();
        let injected = args.get::<Request>("request").unwrap();
        assert!(Arc::ptr_eq(&injected, &request));

        assert!(container
            .autowire_call_args(&[Parameter::request("request")], None)
            .is_err());
    }

    #[test]
    fn test_captures_follow_services() {
        let args = Args::default().with_captures(vec![Some("512".into()), None]);
        assert_eq!(args.capture(0), Some("512"));
        assert_eq!(args.capture(1), None);
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_get_reports_type_mismatch() {
        let container = Container::new();
        let args = container
            .autowire_call_args(&[Parameter::service::<Clock>("clock")], None)
            .unwrap();
        let err = args.get::<Mailer>("clock").unwrap_err();
        assert!(matches!(err, ContainerError::TypeMismatch { .. }));
    }
}
