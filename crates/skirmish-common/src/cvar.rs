// cvar.rs — dynamic variable tracking

use crate::common::com_printf;
use crate::q_shared::{
    info_set_value_for_key, CVAR_LATCH, CVAR_NOSET, CVAR_SERVERINFO, CVAR_USERINFO,
    MAX_INFO_STRING,
};

use parking_lot::Mutex;
use std::collections::HashMap;

/// A console variable.
#[derive(Clone)]
pub struct Cvar {
    pub name: String,
    pub string: String,
    pub latched_string: Option<String>,
    pub flags: i32,
    pub modified: bool,
    pub value: f32,
    pub description: Option<String>,
}

/// The full cvar system context.
pub struct CvarContext {
    pub cvar_vars: Vec<Cvar>,
    /// O(1) cvar lookup by name -> index in cvar_vars
    cvar_index: HashMap<String, usize>,
}

impl CvarContext {
    pub fn new() -> Self {
        Self {
            cvar_vars: Vec::new(),
            cvar_index: HashMap::new(),
        }
    }

    /// Validate that a string doesn't contain characters invalid in info strings.
    pub fn info_validate(s: &str) -> bool {
        !s.contains('\\') && !s.contains('"') && !s.contains(';')
    }

    pub fn find_var_index(&self, name: &str) -> Option<usize> {
        self.cvar_index.get(name).copied()
    }

    pub fn find_var(&self, name: &str) -> Option<&Cvar> {
        self.cvar_index.get(name).map(|&idx| &self.cvar_vars[idx])
    }

    pub fn find_var_mut(&mut self, name: &str) -> Option<&mut Cvar> {
        if let Some(&idx) = self.cvar_index.get(name) {
            Some(&mut self.cvar_vars[idx])
        } else {
            None
        }
    }

    /// Get the floating-point value of a cvar. Returns 0 if not found.
    pub fn variable_value(&self, name: &str) -> f32 {
        match self.find_var(name) {
            Some(var) => var.value,
            None => 0.0,
        }
    }

    /// Get the string value of a cvar. Returns "" if not found.
    pub fn variable_string(&self, name: &str) -> &str {
        match self.find_var(name) {
            Some(var) => &var.string,
            None => "",
        }
    }

    /// Get or create a cvar. If it already exists, the value is not changed
    /// but flags are OR'd in and a description is attached if absent.
    pub fn get(
        &mut self,
        name: &str,
        value: Option<&str>,
        flags: i32,
        description: Option<&str>,
    ) -> Option<usize> {
        if flags & (CVAR_USERINFO | CVAR_SERVERINFO) != 0 && !Self::info_validate(name) {
            com_printf("invalid info cvar name\n");
            return None;
        }

        if let Some(&idx) = self.cvar_index.get(name) {
            self.cvar_vars[idx].flags |= flags;
            if self.cvar_vars[idx].description.is_none() {
                self.cvar_vars[idx].description = description.map(String::from);
            }
            return Some(idx);
        }

        let value = value?;

        if flags & (CVAR_USERINFO | CVAR_SERVERINFO) != 0 && !Self::info_validate(value) {
            com_printf("invalid info cvar value\n");
            return None;
        }

        let float_val = value.parse::<f32>().unwrap_or(0.0);
        let idx = self.cvar_vars.len();
        self.cvar_vars.push(Cvar {
            name: name.to_string(),
            string: value.to_string(),
            latched_string: None,
            flags,
            modified: true,
            value: float_val,
            description: description.map(String::from),
        });
        self.cvar_index.insert(name.to_string(), idx);

        Some(idx)
    }

    fn set2(&mut self, name: &str, value: &str, force: bool, server_running: bool) -> Option<usize> {
        let idx = match self.find_var_index(name) {
            Some(idx) => idx,
            None => return self.get(name, Some(value), 0, None),
        };

        if self.cvar_vars[idx].flags & (CVAR_USERINFO | CVAR_SERVERINFO) != 0
            && !Self::info_validate(value)
        {
            com_printf("invalid info cvar value\n");
            return Some(idx);
        }

        if !force {
            if self.cvar_vars[idx].flags & CVAR_NOSET != 0 {
                com_printf(&format!("{} is write protected.\n", name));
                return Some(idx);
            }

            if self.cvar_vars[idx].flags & CVAR_LATCH != 0 {
                if let Some(ref latched) = self.cvar_vars[idx].latched_string {
                    if value == latched {
                        return Some(idx);
                    }
                } else if value == self.cvar_vars[idx].string {
                    return Some(idx);
                }

                if server_running {
                    com_printf(&format!("{} will be changed for next game.\n", name));
                    self.cvar_vars[idx].latched_string = Some(value.to_string());
                } else {
                    self.cvar_vars[idx].string = value.to_string();
                    self.cvar_vars[idx].value = value.parse::<f32>().unwrap_or(0.0);
                }
                return Some(idx);
            }
        } else {
            self.cvar_vars[idx].latched_string = None;
        }

        if value == self.cvar_vars[idx].string {
            return Some(idx); // not changed
        }

        self.cvar_vars[idx].modified = true;
        self.cvar_vars[idx].string = value.to_string();
        self.cvar_vars[idx].value = value.parse::<f32>().unwrap_or(0.0);

        Some(idx)
    }

    /// Set a cvar value (respects NOSET and LATCH flags).
    pub fn set(&mut self, name: &str, value: &str) -> Option<usize> {
        self.set2(name, value, false, false)
    }

    /// Set a cvar value while a server is running (LATCH defers to next game).
    pub fn set_while_running(&mut self, name: &str, value: &str) -> Option<usize> {
        self.set2(name, value, false, true)
    }

    /// Force-set a cvar value (ignores NOSET and LATCH).
    pub fn force_set(&mut self, name: &str, value: &str) -> Option<usize> {
        self.set2(name, value, true, false)
    }

    /// Set a cvar from a float value.
    pub fn set_value(&mut self, name: &str, value: f32) {
        let val_str = if value == (value as i32) as f32 {
            format!("{}", value as i32)
        } else {
            format!("{}", value)
        };
        self.set(name, &val_str);
    }

    /// Apply all latched variable changes.
    pub fn get_latched_vars(&mut self) {
        for var in &mut self.cvar_vars {
            if let Some(latched) = var.latched_string.take() {
                var.string = latched;
                var.value = var.string.parse::<f32>().unwrap_or(0.0);
                var.modified = true;
            }
        }
    }

    /// Build an info string from all cvars with the given flag bit set.
    pub fn bit_info(&self, bit: i32) -> String {
        let mut info = String::with_capacity(MAX_INFO_STRING);
        for var in &self.cvar_vars {
            if var.flags & bit != 0 {
                info_set_value_for_key(&mut info, &var.name, &var.string);
            }
        }
        info
    }

    pub fn serverinfo(&self) -> String {
        self.bit_info(CVAR_SERVERINFO)
    }
}

impl Default for CvarContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Global singleton and free-function wrappers
// ============================================================

static CVAR_CTX: Mutex<Option<CvarContext>> = Mutex::new(None);

pub fn cvar_init() {
    let mut g = CVAR_CTX.lock();
    if g.is_none() {
        *g = Some(CvarContext::new());
    }
}

pub fn cvar_shutdown() {
    let mut g = CVAR_CTX.lock();
    *g = None;
}

pub fn cvar_get(name: &str, value: &str, flags: i32, description: Option<&str>) -> Option<usize> {
    let mut g = CVAR_CTX.lock();
    if g.is_none() {
        *g = Some(CvarContext::new());
    }
    g.as_mut().and_then(|c| c.get(name, Some(value), flags, description))
}

pub fn cvar_set(name: &str, value: &str) {
    if let Some(ref mut c) = *CVAR_CTX.lock() {
        c.set(name, value);
    }
}

pub fn cvar_set_value(name: &str, value: f32) {
    if let Some(ref mut c) = *CVAR_CTX.lock() {
        c.set_value(name, value);
    }
}

pub fn cvar_force_set(name: &str, value: &str) {
    if let Some(ref mut c) = *CVAR_CTX.lock() {
        c.force_set(name, value);
    }
}

pub fn cvar_variable_value(name: &str) -> f32 {
    CVAR_CTX.lock().as_ref().map_or(0.0, |c| c.variable_value(name))
}

pub fn cvar_variable_string(name: &str) -> String {
    CVAR_CTX
        .lock()
        .as_ref()
        .map_or(String::new(), |c| c.variable_string(name).to_string())
}

pub fn cvar_serverinfo() -> String {
    CVAR_CTX.lock().as_ref().map_or(String::new(), |c| c.serverinfo())
}

pub fn cvar_get_latched_vars() {
    if let Some(ref mut c) = *CVAR_CTX.lock() {
        c.get_latched_vars();
    }
}

/// Access the global cvar context with a closure. Returns None if not initialized.
pub fn with_cvar_ctx<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut CvarContext) -> R,
{
    let mut g = CVAR_CTX.lock();
    g.as_mut().map(f)
}

/// Get a cvar's float value by handle (index). Returns 0.0 if invalid.
pub fn cvar_value_by_handle(handle: usize) -> f32 {
    CVAR_CTX
        .lock()
        .as_ref()
        .map_or(0.0, |c| c.cvar_vars.get(handle).map_or(0.0, |v| v.value))
}

/// Get a cvar's string value by handle (index). Returns "" if invalid.
pub fn cvar_string_by_handle(handle: usize) -> String {
    CVAR_CTX.lock().as_ref().map_or(String::new(), |c| {
        c.cvar_vars.get(handle).map_or(String::new(), |v| v.string.clone())
    })
}

/// Check if a cvar has been modified, by handle (index).
pub fn cvar_modified_by_handle(handle: usize) -> bool {
    CVAR_CTX
        .lock()
        .as_ref()
        .is_some_and(|c| c.cvar_vars.get(handle).is_some_and(|v| v.modified))
}

/// Clear the modified flag on a cvar, by handle (index).
pub fn cvar_clear_modified_by_handle(handle: usize) {
    if let Some(ref mut c) = *CVAR_CTX.lock() {
        if let Some(v) = c.cvar_vars.get_mut(handle) {
            v.modified = false;
        }
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cvar_get_and_find() {
        let mut ctx = CvarContext::new();
        ctx.get("test_var", Some("42"), 0, None);
        assert_eq!(ctx.variable_value("test_var"), 42.0);
        assert_eq!(ctx.variable_string("test_var"), "42");
    }

    #[test]
    fn test_cvar_set() {
        let mut ctx = CvarContext::new();
        ctx.get("test_var", Some("10"), 0, None);
        ctx.set("test_var", "20");
        assert_eq!(ctx.variable_value("test_var"), 20.0);
    }

    #[test]
    fn test_cvar_noset() {
        let mut ctx = CvarContext::new();
        ctx.get("test_var", Some("10"), CVAR_NOSET, None);
        ctx.set("test_var", "20"); // should be blocked
        assert_eq!(ctx.variable_value("test_var"), 10.0);
    }

    #[test]
    fn test_cvar_force_set() {
        let mut ctx = CvarContext::new();
        ctx.get("test_var", Some("10"), CVAR_NOSET, None);
        ctx.force_set("test_var", "20");
        assert_eq!(ctx.variable_value("test_var"), 20.0);
    }

    #[test]
    fn test_cvar_get_creates_once() {
        let mut ctx = CvarContext::new();
        ctx.get("test", Some("1"), 0, None);
        ctx.get("test", Some("2"), 0, None); // should NOT change value
        assert_eq!(ctx.variable_string("test"), "1");
    }

    #[test]
    fn test_cvar_modified_tracking() {
        let mut ctx = CvarContext::new();
        let idx = ctx.get("g_gravity", Some("800"), 0, None).unwrap();
        assert!(ctx.cvar_vars[idx].modified); // new cvars start modified
        ctx.cvar_vars[idx].modified = false;
        ctx.set("g_gravity", "800"); // unchanged value does not re-flag
        assert!(!ctx.cvar_vars[idx].modified);
        ctx.set("g_gravity", "400");
        assert!(ctx.cvar_vars[idx].modified);
    }

    #[test]
    fn test_cvar_latch_while_running() {
        let mut ctx = CvarContext::new();
        ctx.get("g_gameplay", Some("0"), CVAR_LATCH, None);
        ctx.set_while_running("g_gameplay", "2");
        assert_eq!(ctx.variable_string("g_gameplay"), "0"); // not changed yet
        assert_eq!(ctx.cvar_vars[0].latched_string.as_deref(), Some("2"));
        ctx.get_latched_vars();
        assert_eq!(ctx.variable_string("g_gameplay"), "2");
    }

    #[test]
    fn test_cvar_info_validate() {
        let mut ctx = CvarContext::new();
        let result = ctx.get("bad\\name", Some("value"), CVAR_USERINFO, None);
        assert!(result.is_none());
    }

    #[test]
    fn test_serverinfo_bit_info() {
        let mut ctx = CvarContext::new();
        ctx.get("g_gameplay", Some("1"), CVAR_SERVERINFO, None);
        ctx.get("private_var", Some("x"), 0, None);
        let info = ctx.serverinfo();
        assert!(info.contains("\\g_gameplay\\1"));
        assert!(!info.contains("private_var"));
    }
}
