use crate::collectors::arg::ArgKind;
use crate::collectors::{COLLECTOR_NAMES, Collector, all_factories};
use clap::{Arg, Command};

pub fn add_collectors_args(mut cmd: Command) -> Command {
    let factories = all_factories();

    for &name in COLLECTOR_NAMES {
        let default_enabled = factories.get(name).is_some_and(|factory| {
            let collector = factory();
            collector.enabled_by_default()
        });

        let enable_flag: &'static str = Box::leak(format!("collector.{name}").into_boxed_str());
        let disable_flag: &'static str = Box::leak(format!("no-collector.{name}").into_boxed_str());

        let default_indicator = if default_enabled {
            " [default: enabled]"
        } else {
            " [default: disabled]"
        };
        let enable_help: &'static str =
            Box::leak(format!("Enable the {name} collector{default_indicator}").into_boxed_str());
        let disable_help: &'static str =
            Box::leak(format!("Disable the {name} collector").into_boxed_str());

        cmd = cmd
            .arg(
                Arg::new(enable_flag)
                    .long(enable_flag)
                    .help(enable_help)
                    .action(clap::ArgAction::SetTrue)
                    .default_value(if default_enabled { "true" } else { "false" }),
            )
            .arg(
                Arg::new(disable_flag)
                    .long(disable_flag)
                    .help(disable_help)
                    .action(clap::ArgAction::SetTrue)
                    .overrides_with(enable_flag),
            );
    }
    add_collect_args(cmd)
}

/// Derives one `--collect.<name>.<arg>` flag per collector `ArgDef`, the way
/// `add_collectors_args` above derives `--collector.<name>` from
/// `enabled_by_default()`.
pub fn add_collect_args(mut cmd: Command) -> Command {
    let factories = all_factories();

    for &name in COLLECTOR_NAMES {
        let Some(factory) = factories.get(name) else {
            continue;
        };
        let collector = factory();

        for def in collector.arg_defs() {
            let flag: &'static str =
                Box::leak(format!("collect.{name}.{}", def.name).into_boxed_str());
            let help: &'static str =
                Box::leak(format!("{} [default: {}]", def.help, def.default).into_boxed_str());

            let arg = Arg::new(flag).long(flag).help(help);
            cmd = cmd.arg(if def.kind == ArgKind::Bool {
                arg.action(clap::ArgAction::SetTrue)
            } else {
                arg
            });
        }
    }
    cmd
}

/// Collects every `--collect.<name>.<arg>` flag the user actually passed into
/// `(collector_name, Vec<Arg>)` groups, suitable for
/// `CollectorRegistry::init_from_flags`.
#[must_use]
pub fn get_collect_overrides(matches: &clap::ArgMatches) -> Vec<(&'static str, Vec<crate::collectors::arg::Arg>)> {
    use crate::collectors::arg::{Arg as CollectorArg, ArgValue};

    let factories = all_factories();
    let mut overrides = Vec::new();

    for &name in COLLECTOR_NAMES {
        let Some(factory) = factories.get(name) else {
            continue;
        };
        let collector = factory();
        let mut args = Vec::new();

        for def in collector.arg_defs() {
            let flag = format!("collect.{name}.{}", def.name);
            if def.kind == ArgKind::Bool {
                if matches.get_flag(&flag) {
                    args.push(CollectorArg::new(def.name, ArgValue::Bool(true)));
                }
            } else if let Some(raw) = matches.get_one::<String>(&flag)
                && let Ok(value) = def.parse(raw)
            {
                args.push(CollectorArg::new(def.name, value));
            }
        }

        if !args.is_empty() {
            overrides.push((name, args));
        }
    }

    overrides
}
