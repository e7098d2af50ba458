//! Basic usage of the AutoParams API
//!
//! Resolves a few derived types, customizes the pipeline and expands a
//! parameterized test from CSV rows.

use autoparams::{
    CsvAutoSource, Freeze, ResolutionConfig, ResolutionContext, Resolvable, TestCaseGenerator,
    TestSignature,
};

#[derive(Debug, Clone, Resolvable)]
struct Address {
    street: String,
    #[autoparams(min = 1, max = 500)]
    number: u16,
}

#[derive(Debug, Clone, Resolvable)]
struct Customer {
    id: u64,
    name: String,
    addresses: Vec<Address>,
}

#[derive(Debug, Clone, Resolvable)]
enum Status {
    Active,
    Suspended { reason: String },
}

fn example_1_resolve() {
    println!("=== Example 1: Resolving Values ===");

    let mut context = ResolutionContext::with_config(ResolutionConfig::default().with_seed(1));
    match context.resolve::<Customer>() {
        Ok(customer) => println!("✓ {:#?}", customer),
        Err(error) => println!("✗ {}", error),
    }
    match context.resolve::<Status>() {
        Ok(status) => println!("✓ {:?}", status),
        Err(error) => println!("✗ {}", error),
    }
}

fn example_2_freeze() {
    println!("\n=== Example 2: Freezing a Value ===");

    let mut context = ResolutionContext::with_config(ResolutionConfig::default().with_seed(2));
    context.apply_customizer(&Freeze::value("Main Street".to_string()));

    match context.resolve::<Customer>() {
        Ok(customer) => {
            for address in &customer.addresses {
                println!("  {} {}", address.number, address.street);
            }
        }
        Err(error) => println!("✗ {}", error),
    }
}

fn example_3_parameterized() {
    println!("\n=== Example 3: Parameterized Test Cases ===");

    let signature = TestSignature::new("ships_order")
        .parameter::<u32>("quantity")
        .parameter::<String>("sku")
        .parameter::<Customer>("customer");

    let cases = CsvAutoSource::new(["1, apple", "12, pear"])
        .provider()
        .and_then(|provider| {
            TestCaseGenerator::with_config(ResolutionConfig::default().with_seed(3))
                .generate(&signature, Some(&provider))
        });

    match cases {
        Ok(cases) => {
            for case in cases {
                let customer = case.get::<Customer>(2).map(|customer| customer.id);
                println!("  {} -> customer {:?}", case.display_name, customer);
            }
        }
        Err(error) => println!("✗ {}", error),
    }
}

fn main() {
    example_1_resolve();
    example_2_freeze();
    example_3_parameterized();
}
