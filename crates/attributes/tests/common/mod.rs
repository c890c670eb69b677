//! Container kinds shared by the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use attribute_core::{
    AttributeContainer, AttributeSchema, ContainerBuilder, FieldError, FieldSpec, HolderKind,
    HookError, Modifier, ModifierKind, SchemaError,
};

/// Installs a test-writer subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Gem;

impl AttributeSchema for Gem {
    fn kind(&self) -> &'static str {
        "Gem"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::new("label", HolderKind::Text).describe("Gem name"),
            FieldSpec::new("power", HolderKind::NumberDouble),
        ];
        FIELDS
    }

    fn initialize(&self, b: &mut ContainerBuilder) -> Result<(), SchemaError> {
        b.text("label", "")?;
        b.number("power", 0.0_f64)?;
        Ok(())
    }
}

pub struct Sword;

impl AttributeSchema for Sword {
    fn kind(&self) -> &'static str {
        "Sword"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::new("damage", HolderKind::ReactiveFloat).describe("Base damage"),
            FieldSpec::new("durability", HolderKind::BoundedInt),
        ];
        FIELDS
    }

    fn initialize(&self, b: &mut ContainerBuilder) -> Result<(), SchemaError> {
        b.reactive("damage", 5.0_f32)?;
        b.bounded("durability", 0_i32, 50, 50)?;
        b.sequence("sockets", [Gem])?;
        Ok(())
    }
}

/// Player-like kind with every holder type, one child, one sequence and a
/// field excluded from saving.
pub struct Hero;

impl AttributeSchema for Hero {
    fn kind(&self) -> &'static str {
        "Hero"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::new("name", HolderKind::Text).describe("Display name"),
            FieldSpec::new("strength", HolderKind::ReactiveInt).describe("Strength"),
            FieldSpec::new("attack", HolderKind::ReactiveInt).describe("Attack"),
            FieldSpec::new("speed", HolderKind::ReactiveDouble),
            FieldSpec::new("hp", HolderKind::BoundedInt).describe("Hit points"),
            FieldSpec::new("stamina", HolderKind::BoundedFloat),
            FieldSpec::new("gold", HolderKind::NumberInt),
            FieldSpec::new("session_kills", HolderKind::NumberInt).ignore_on_save(),
        ];
        FIELDS
    }

    fn initialize(&self, b: &mut ContainerBuilder) -> Result<(), SchemaError> {
        b.text("name", "Nobody")?;
        b.reactive("strength", 10_i32)?;
        b.reactive("attack", 2_i32)?;
        b.reactive("speed", 1.0_f64)?;
        b.bounded("hp", 0_i32, 100, 100)?;
        b.bounded("stamina", 0.0_f32, 10.0, 10.0)?;
        b.number("gold", 0_i32)?;
        b.number("session_kills", 0_i32)?;
        b.child("weapon", Sword)?;
        b.sequence("bag", [Gem, Gem])?;
        Ok(())
    }

    fn bind(&self, c: &AttributeContainer) -> Result<(), FieldError> {
        let strength = c.reactive::<i32>("strength")?;
        c.add_modifiers::<i32>(
            "attack",
            0,
            [Modifier::dynamic(ModifierKind::Add, strength)],
        )?;
        c.bind_group("pools", ["hp"]);
        Ok(())
    }
}

/// Records every hook call; optionally fails or panics in the per-line hook.
pub struct Journal {
    pub log: Rc<RefCell<Vec<String>>>,
    pub fail_lines: bool,
    pub panic_lines: bool,
}

impl Journal {
    pub fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                log: Rc::clone(&log),
                fail_lines: false,
                panic_lines: false,
            },
            log,
        )
    }
}

impl AttributeSchema for Journal {
    fn kind(&self) -> &'static str {
        "Journal"
    }

    fn initialize(&self, b: &mut ContainerBuilder) -> Result<(), SchemaError> {
        b.text("title", "")?;
        b.number("pages", 0_i32)?;
        Ok(())
    }

    fn before_load(&self, _: &AttributeContainer) -> Result<(), HookError> {
        self.log.borrow_mut().push("before".into());
        Ok(())
    }

    fn after_load_line(&self, _: &AttributeContainer, line: &str) -> Result<(), HookError> {
        self.log.borrow_mut().push(format!("line {line}"));
        if self.panic_lines {
            panic!("hook bug");
        }
        if self.fail_lines {
            return Err(HookError("rejected".into()));
        }
        Ok(())
    }

    fn after_load(&self, _: &AttributeContainer) -> Result<(), HookError> {
        self.log.borrow_mut().push("after".into());
        Err(HookError("post-load validation failed".into()))
    }
}
