//! Generators for primitive types and strings.
//!
//! Each type gets its own [`TypeMatchingGenerator`]; [`primitive_generators`]
//! lists them in the order the default pipeline tries them.

use std::sync::Arc;

use num_traits::{Bounded, NumCast, PrimInt};
use rand::Rng;
use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Alphanumeric, Distribution, Standard};
use rand::rngs::StdRng;

use crate::config::ConfigError;
use crate::construct::ParameterDescriptor;
use crate::error::ResolutionError;
use crate::generator::{SharedGenerator, TypeMatchingGenerator};
use crate::types::Resolvable;

/// Booleans, characters, numbers, strings and UUIDs
pub fn primitive_generators() -> Vec<SharedGenerator> {
    vec![
        Arc::new(integer::<i8>()),
        Arc::new(integer::<i16>()),
        Arc::new(integer::<i32>()),
        Arc::new(integer::<i64>()),
        Arc::new(integer::<i128>()),
        Arc::new(integer::<isize>()),
        Arc::new(integer::<u8>()),
        Arc::new(integer::<u16>()),
        Arc::new(integer::<u32>()),
        Arc::new(integer::<u64>()),
        Arc::new(integer::<u128>()),
        Arc::new(integer::<usize>()),
        Arc::new(boolean()),
        Arc::new(character()),
        Arc::new(float::<f32>()),
        Arc::new(float::<f64>()),
        Arc::new(string()),
        Arc::new(uuid_v4()),
    ]
}

/// Integers over the full range of `T`, or the bounds of the parameter being filled
pub fn integer<T>() -> TypeMatchingGenerator
where
    T: Resolvable + PrimInt + SampleUniform,
{
    TypeMatchingGenerator::create::<T, _>(|query, context| {
        let bounds = query.parameter().and_then(ParameterDescriptor::bounds);
        generate_integer::<T>(bounds, context.rng())
    })
}

/// Floats drawn from `[0, 1)`
pub fn float<T>() -> TypeMatchingGenerator
where
    T: Resolvable,
    Standard: Distribution<T>,
{
    TypeMatchingGenerator::create::<T, _>(|_, context| Ok(context.rng().r#gen::<T>()))
}

pub fn boolean() -> TypeMatchingGenerator {
    TypeMatchingGenerator::create::<bool, _>(|_, context| Ok(context.rng().r#gen::<bool>()))
}

/// Alphanumeric ASCII characters
pub fn character() -> TypeMatchingGenerator {
    TypeMatchingGenerator::create::<char, _>(|_, context| {
        Ok(context.rng().sample(Alphanumeric) as char)
    })
}

/// The parameter name followed by a random UUID, so values stay unique and
/// readable in failure messages
pub fn string() -> TypeMatchingGenerator {
    TypeMatchingGenerator::create::<String, _>(|query, context| {
        let prefix = query.parameter_name().unwrap_or_default();
        Ok(format!("{}{}", prefix, random_uuid(context.rng())))
    })
}

pub fn uuid_v4() -> TypeMatchingGenerator {
    TypeMatchingGenerator::create::<uuid::Uuid, _>(|_, context| Ok(random_uuid(context.rng())))
}

/// A version 4 UUID drawn from the context RNG
pub fn random_uuid(rng: &mut StdRng) -> uuid::Uuid {
    uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid()
}

fn generate_integer<T>(
    bounds: Option<(i128, i128)>,
    rng: &mut StdRng,
) -> Result<T, ResolutionError>
where
    T: PrimInt + SampleUniform,
{
    let Some((min, max)) = bounds else {
        return Ok(rng.gen_range(<T as Bounded>::min_value()..=<T as Bounded>::max_value()));
    };
    if min > max {
        return Err(ConfigError::InvalidBounds { min, max }.into());
    }

    let low = clamp::<T>(min);
    let high = clamp::<T>(max);
    Ok(rng.gen_range(low..=high))
}

// Bounds outside the type's range saturate to its limits.
fn clamp<T: PrimInt>(value: i128) -> T {
    <T as NumCast>::from(value).unwrap_or_else(|| {
        if value < 0 {
            <T as Bounded>::min_value()
        } else {
            <T as Bounded>::max_value()
        }
    })
}
