use arcstr::ArcStr;
use minipack_error::BundleError;
use oxc_index::IndexVec;
use rustc_hash::FxHashMap;

use crate::{HookCallback, HookFilter, HookKind, HookOrder, Plugin, PluginIdx};

#[derive(Debug)]
pub struct HookRegistration {
  pub plugin_idx: PluginIdx,
  pub order: HookOrder,
  pub filter: Option<HookFilter>,
  pub callback: HookCallback,
}

impl HookRegistration {
  pub fn accepts(&self, id: Option<&str>, code: Option<&str>) -> bool {
    self.filter.as_ref().is_none_or(|filter| filter.is_match(id, code))
  }
}

/// Registrations per hook kind, kept in dispatch order: tier first, then plugin declaration order.
/// Filled while plugins are added and only read afterwards.
#[derive(Debug, Default)]
pub struct HookRegistry {
  plugin_names: IndexVec<PluginIdx, ArcStr>,
  hooks: FxHashMap<HookKind, Vec<HookRegistration>>,
}

impl HookRegistry {
  pub fn from_plugins(plugins: Vec<Plugin>) -> Result<Self, BundleError> {
    let mut registry = Self::default();
    for plugin in plugins {
      registry.add_plugin(plugin)?;
    }
    Ok(registry)
  }

  pub fn add_plugin(&mut self, plugin: Plugin) -> Result<PluginIdx, BundleError> {
    let Plugin { name, hooks } = plugin;
    let plugin_idx = self.plugin_names.push(name);
    for (options, callback) in hooks {
      self.register(callback, plugin_idx, options.order, options.filter)?;
    }
    Ok(plugin_idx)
  }

  pub fn register(
    &mut self,
    callback: HookCallback,
    plugin_idx: PluginIdx,
    order: HookOrder,
    filter: Option<HookFilter>,
  ) -> Result<(), BundleError> {
    let kind = callback.kind();
    let registrations = self.hooks.entry(kind).or_default();

    if kind.is_exclusive() && registrations.iter().any(|reg| reg.plugin_idx == plugin_idx) {
      return Err(BundleError::Configuration(format!(
        "Plugin {:?} registers the `{kind}` hook more than once",
        self.plugin_names.get(plugin_idx).map_or("<unknown>", ArcStr::as_str)
      )));
    }

    let position = registrations.partition_point(|reg| reg.order <= order);
    registrations.insert(position, HookRegistration { plugin_idx, order, filter, callback });
    Ok(())
  }

  pub fn registrations(&self, kind: HookKind) -> &[HookRegistration] {
    self.hooks.get(&kind).map_or(&[], Vec::as_slice)
  }

  pub fn has_registrations(&self, kind: HookKind) -> bool {
    !self.registrations(kind).is_empty()
  }

  pub fn plugin_name(&self, plugin_idx: PluginIdx) -> &ArcStr {
    &self.plugin_names[plugin_idx]
  }

  pub fn plugin_count(&self) -> usize {
    self.plugin_names.len()
  }
}

#[cfg(test)]
mod tests {
  use minipack_error::BundleError;

  use crate::{HookKind, HookOrder, HookRegistry, Plugin, PluginIdx};

  fn noop_plugin(name: &str, order: HookOrder) -> Plugin {
    Plugin::new(name).transform(order, |_, _| async { Ok(None) })
  }

  #[test]
  fn registrations_follow_tiers_then_declaration_order() {
    let registry = HookRegistry::from_plugins(vec![
      noop_plugin("a", HookOrder::Post),
      noop_plugin("b", HookOrder::Normal),
      noop_plugin("c", HookOrder::Pre),
      noop_plugin("d", HookOrder::Normal),
      noop_plugin("e", HookOrder::Pre),
    ])
    .unwrap();

    let names = registry
      .registrations(HookKind::Transform)
      .iter()
      .map(|reg| registry.plugin_name(reg.plugin_idx).as_str())
      .collect::<Vec<_>>();
    assert_eq!(names, vec!["c", "e", "b", "d", "a"]);
    assert_eq!(registry.plugin_count(), 5);
    assert!(!registry.has_registrations(HookKind::Load));
  }

  #[test]
  fn exclusive_hooks_register_once_per_plugin() {
    let plugin = Plugin::new("twice")
      .transform(HookOrder::Normal, |_, _| async { Ok(None) })
      .transform(HookOrder::Post, |_, _| async { Ok(None) });
    let Err(err) = HookRegistry::from_plugins(vec![plugin]) else {
      panic!("registering `transform` twice must fail");
    };
    assert!(matches!(err, BundleError::Configuration(ref msg) if msg.contains("transform")));

    let notifications = Plugin::new("notify")
      .build_start(HookOrder::Normal, |_, ()| async { Ok(()) })
      .build_start(HookOrder::Pre, |_, ()| async { Ok(()) });
    let registry = HookRegistry::from_plugins(vec![notifications]).unwrap();
    let registrations = registry.registrations(HookKind::BuildStart);
    assert_eq!(registrations.len(), 2);
    assert_eq!(registrations[0].order, HookOrder::Pre);
    assert_eq!(registrations[0].plugin_idx, PluginIdx::new(0));
  }
}
