//! Named parameter allocation
//!
//! A [`VarStore`] owns the target device and a registry of every parameter it has
//! handed out. [`VarPath`] is a name scope inside a store; nested scopes are built
//! with [`VarPath::pp`] and joined with `.`, so a tensor registered as `w_ih` under
//! `lstm` / `l0` is recorded as `lstm.l0.w_ih`.
//!
//! The store only records names, shapes and initializers. The allocated
//! [`Param`]s are owned by the layer that requested them.

use burn::module::Param;
use burn::nn::Initializer;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Source of named, initialized parameters on a device
pub trait ParamSource<B: Backend> {
    /// Allocate a Kaiming-uniform initialized parameter
    fn kaiming_uniform<const D: usize>(&self, name: &str, shape: [usize; D])
        -> Param<Tensor<B, D>>;

    /// Allocate a zero-filled parameter
    fn zeros<const D: usize>(&self, name: &str, shape: [usize; D]) -> Param<Tensor<B, D>>;

    /// Device every parameter is allocated on
    fn device(&self) -> B::Device;

    /// Nested scope named `name`
    fn sub(&self, name: &str) -> Self
    where
        Self: Sized;
}

/// Initializer used for a registered variable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarInit {
    KaimingUniform,
    Zeros,
}

/// Registry entry for one allocated parameter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarInfo {
    pub name: String,
    pub shape: Vec<usize>,
    pub init: VarInit,
}

#[derive(Debug, Default)]
struct Registry {
    vars: Vec<VarInfo>,
    names: HashSet<String>,
}

impl Registry {
    /// Register `name`, appending `_1`, `_2`, ... if it is already taken
    fn register(&mut self, name: String, shape: Vec<usize>, init: VarInit) -> String {
        let mut unique = name.clone();
        let mut suffix = 1;
        while self.names.contains(&unique) {
            unique = format!("{name}_{suffix}");
            suffix += 1;
        }

        self.names.insert(unique.clone());
        self.vars.push(VarInfo {
            name: unique.clone(),
            shape,
            init,
        });
        unique
    }
}

/// Root of a parameter namespace bound to a device
#[derive(Clone, Debug)]
pub struct VarStore<B: Backend> {
    device: B::Device,
    registry: Rc<RefCell<Registry>>,
}

impl<B: Backend> VarStore<B> {
    pub fn new(device: &B::Device) -> Self {
        Self {
            device: device.clone(),
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    /// The unscoped root path
    pub fn root(&self) -> VarPath<B> {
        VarPath {
            store: self.clone(),
            prefix: Vec::new(),
        }
    }

    pub fn device(&self) -> B::Device {
        self.device.clone()
    }

    /// Every variable allocated so far, in allocation order
    pub fn vars(&self) -> Vec<VarInfo> {
        self.registry.borrow().vars.clone()
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A name scope inside a [`VarStore`]
#[derive(Clone, Debug)]
pub struct VarPath<B: Backend> {
    store: VarStore<B>,
    prefix: Vec<String>,
}

impl<B: Backend> VarPath<B> {
    /// Push a sub-scope
    pub fn pp(&self, name: impl Into<String>) -> Self {
        let mut prefix = self.prefix.clone();
        prefix.push(name.into());
        Self {
            store: self.store.clone(),
            prefix,
        }
    }

    pub fn store(&self) -> &VarStore<B> {
        &self.store
    }

    /// Fully qualified name for `name` in this scope
    pub fn path(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.prefix.join("."), name)
        }
    }

    fn register(&self, name: &str, shape: Vec<usize>, init: VarInit) -> String {
        let full = self
            .store
            .registry
            .borrow_mut()
            .register(self.path(name), shape, init);
        log::debug!("registered parameter {full} ({init:?})");
        full
    }
}

impl<B: Backend> ParamSource<B> for VarPath<B> {
    fn kaiming_uniform<const D: usize>(
        &self,
        name: &str,
        shape: [usize; D],
    ) -> Param<Tensor<B, D>> {
        self.register(name, shape.to_vec(), VarInit::KaimingUniform);

        // bound = 1 / sqrt(fan_in), the usual default for recurrent weights
        let fan_in = if D > 1 {
            shape[1..].iter().product()
        } else {
            shape[0]
        };
        Initializer::KaimingUniform {
            gain: 1.0 / 3.0f64.sqrt(),
            fan_out_only: false,
        }
        .init_with(shape, Some(fan_in), None, &self.store.device)
    }

    fn zeros<const D: usize>(&self, name: &str, shape: [usize; D]) -> Param<Tensor<B, D>> {
        self.register(name, shape.to_vec(), VarInit::Zeros);
        Initializer::Zeros.init(shape, &self.store.device)
    }

    fn device(&self) -> B::Device {
        self.store.device()
    }

    fn sub(&self, name: &str) -> Self {
        self.pp(name)
    }
}
