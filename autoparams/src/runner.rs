//! Argument lists for parameterized tests.
//!
//! A [`TestCaseGenerator`] turns a [`TestSignature`] and an optional
//! literal source into one [`TestCase`] per invocation. Literal assets fill
//! the leading parameters; every remaining parameter is generated through a
//! fresh [`ResolutionContext`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{ResolutionConfig, create_resolution_config};
use crate::construct::ParameterDescriptor;
use crate::context::ResolutionContext;
use crate::customization::{Customizer, Freeze, SharedCustomizer};
use crate::error::ResolutionError;
use crate::generator::{SharedGenerator, default_generator};
use crate::query::ObjectQuery;
use crate::rng::invocation_seed;
use crate::source::{ArgumentsProvider, AssetConverter, AssetRow, SharedAssetConverter};
use crate::types::Resolvable;
use crate::value::Value;

/// Name and ordered parameters of a test function
#[derive(Debug, Clone)]
pub struct TestSignature {
    name: String,
    parameters: Vec<ParameterDescriptor>,
}

impl TestSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a named parameter of type `T`
    pub fn parameter<T: Resolvable>(self, name: impl Into<String>) -> Self {
        self.with_parameter(ParameterDescriptor::named::<T>(name))
    }

    /// Append a parameter with its full description
    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }
}

/// The arguments of one test invocation
#[derive(Debug, Clone)]
pub struct TestCase {
    pub index: usize,
    pub display_name: String,
    pub arguments: Vec<Value>,
}

impl TestCase {
    /// The argument at `position`, downcast to `T`
    pub fn get<T: Resolvable>(&self, position: usize) -> Result<T, ResolutionError> {
        self.arguments
            .get(position)
            .cloned()
            .ok_or_else(|| {
                ResolutionError::internal(format!(
                    "test case {} has no argument at position {}",
                    self.index, position
                ))
            })?
            .downcast::<T>()
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

/// Builds test cases for a signature
#[derive(Clone)]
pub struct TestCaseGenerator {
    config: ResolutionConfig,
    generator: SharedGenerator,
    customizers: Vec<SharedCustomizer>,
}

impl TestCaseGenerator {
    /// Generator over the default pipeline with the global configuration
    pub fn new() -> Self {
        Self::with_config(create_resolution_config())
    }

    pub fn with_config(config: ResolutionConfig) -> Self {
        Self {
            config,
            generator: default_generator(),
            customizers: Vec::new(),
        }
    }

    /// Replace the base generator every invocation starts from
    pub fn with_generator(mut self, generator: SharedGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Apply `customizer` to every invocation's context, after those already added
    pub fn customize<C: Customizer + 'static>(mut self, customizer: C) -> Self {
        self.customizers.push(Arc::new(customizer));
        self
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    /// The fresh context of invocation `index`
    pub fn create_context(&self, index: usize) -> ResolutionContext {
        let mut config = self.config.clone();
        config.seed = self.config.seed.map(|seed| invocation_seed(seed, index));

        let mut context = ResolutionContext::with_generator(Arc::clone(&self.generator), config);
        for customizer in &self.customizers {
            context.apply_customizer(customizer.as_ref());
        }
        context
    }

    /// Build every invocation in order.
    ///
    /// Without a provider, `repeat` invocations are fully generated.
    pub fn generate(
        &self,
        signature: &TestSignature,
        provider: Option<&dyn ArgumentsProvider>,
    ) -> Result<Vec<TestCase>, ResolutionError> {
        let rows = self.prepare(signature, provider)?;
        let cases = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| self.generate_case(signature, index, row))
            .collect::<Result<Vec<_>, _>>()?;

        info!(test = signature.name(), cases = cases.len(), "generated test cases");
        Ok(cases)
    }

    /// Build every invocation on scoped worker threads.
    ///
    /// Cases come back in invocation order and equal what [`generate`]
    /// returns for the same seed.
    ///
    /// [`generate`]: TestCaseGenerator::generate
    pub fn generate_parallel(
        &self,
        signature: &TestSignature,
        provider: Option<&dyn ArgumentsProvider>,
    ) -> Result<Vec<TestCase>, ResolutionError> {
        let rows: Vec<(usize, AssetRow)> = self
            .prepare(signature, provider)?
            .into_iter()
            .enumerate()
            .collect();
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.config.worker_count().min(rows.len());
        let chunk_size = rows.len().div_ceil(workers);
        debug!(workers, chunk_size, "generating test cases in parallel");

        let outcome = crossbeam::scope(|s| {
            let handles: Vec<_> = rows
                .chunks(chunk_size)
                .map(|chunk| {
                    s.spawn(move |_| {
                        chunk
                            .iter()
                            .map(|(index, row)| self.generate_case(signature, *index, row.clone()))
                            .collect::<Result<Vec<_>, _>>()
                    })
                })
                .collect();

            let mut cases = Vec::with_capacity(rows.len());
            for handle in handles {
                let chunk = handle
                    .join()
                    .map_err(|_| ResolutionError::internal("test case worker panicked"))??;
                cases.extend(chunk);
            }
            Ok::<Vec<TestCase>, ResolutionError>(cases)
        });

        let cases = outcome
            .map_err(|_| ResolutionError::internal("test case generation scope panicked"))??;
        info!(test = signature.name(), cases = cases.len(), "generated test cases");
        Ok(cases)
    }

    fn prepare(
        &self,
        signature: &TestSignature,
        provider: Option<&dyn ArgumentsProvider>,
    ) -> Result<Vec<AssetRow>, ResolutionError> {
        self.config.validate()?;
        for parameter in signature.parameters() {
            parameter.validate()?;
        }

        match provider {
            Some(provider) => provider.provide_rows(signature),
            None => Ok(vec![AssetRow::default(); self.config.repeat]),
        }
    }

    fn generate_case(
        &self,
        signature: &TestSignature,
        index: usize,
        row: AssetRow,
    ) -> Result<TestCase, ResolutionError> {
        let parameters = signature.parameters();
        if row.len() > parameters.len() {
            return Err(ResolutionError::source_error(format!(
                "row {} supplies {} arguments but {} takes {}",
                index + 1,
                row.len(),
                signature.name(),
                parameters.len()
            )));
        }

        let mut context = self.create_context(index);
        let converter: Option<SharedAssetConverter> = if row.is_empty() {
            None
        } else {
            Some(context.resolve()?)
        };

        let label = row.display_name();
        let mut assets = row.into_assets().into_iter();
        let mut arguments = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            let value = match (assets.next(), &converter) {
                (Some(asset), Some(converter)) => converter.convert(parameter, asset)?,
                _ => context.resolve_query(&ObjectQuery::from_parameter(parameter.clone()))?,
            };
            if let Some(matching) = parameter.freeze_matching() {
                let freeze = Freeze::new(parameter.query().clone(), value.clone())
                    .matching(matching.clone());
                context.apply_customizer(&freeze);
            }
            arguments.push(value);
        }

        let display_name = if label.is_empty() {
            let rendered: Vec<String> =
                arguments.iter().map(|value| format!("{:?}", value)).collect();
            format!("[{}] {}", index + 1, rendered.join(", "))
        } else {
            format!("[{}] {}", index + 1, label)
        };

        Ok(TestCase {
            index,
            display_name,
            arguments,
        })
    }
}

impl Default for TestCaseGenerator {
    fn default() -> Self {
        Self::new()
    }
}
