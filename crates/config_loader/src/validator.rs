//! 配置校验模块
//!
//! 校验规则：
//! - 组件名唯一, `kind` 与 `alias_of` 互斥
//! - 未声明 `kind`/`alias_of` 的组件必须已存在 (内置 `log` 或先前声明)
//! - `alias_of` 必须指向已存在的组件
//! - 路由 ID 非空且唯一
//! - `from` 为合法 timer 端点且 period > 0
//! - `to` 非空, 且每个端点引用已注册组件
//! - file 组件参数合法

use std::collections::HashSet;

use contracts::{
    ComponentConfig, ComponentRegistration, ComponentType, ContractError, Endpoint,
    RouteBlueprint, RouteConfig, BUILTIN_LOG_COMPONENT,
};

/// Parameters accepted by `file` components
const FILE_PARAMS: &[&str] = &["base_path", "format"];

/// Values accepted by the `format` parameter of `file` components
const FILE_FORMATS: &[&str] = &["text", "json"];

/// 校验 RouteBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RouteBlueprint) -> Result<(), ContractError> {
    let known = validate_components(blueprint)?;
    validate_routes(blueprint, &known)?;
    Ok(())
}

/// 校验组件声明, 返回全部已知组件名
fn validate_components(blueprint: &RouteBlueprint) -> Result<HashSet<&str>, ContractError> {
    let mut known: HashSet<&str> = HashSet::from([BUILTIN_LOG_COMPONENT]);

    for (idx, component) in blueprint.components.iter().enumerate() {
        let field = format!("components[{idx}](name={})", component.name);

        if component.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("components[{idx}].name"),
                "component name cannot be empty",
            ));
        }

        if let Some(label) = &component.label {
            if label.is_empty() {
                return Err(ContractError::config_validation(
                    format!("{field}.label"),
                    "label cannot be empty",
                ));
            }
        }

        match component.registration() {
            ComponentRegistration::Conflicting => {
                return Err(ContractError::config_validation(
                    field,
                    "kind and alias_of are mutually exclusive",
                ));
            }
            ComponentRegistration::Existing => {
                if !known.contains(component.name.as_str()) {
                    return Err(ContractError::config_validation(
                        field,
                        "unknown component: declare a kind or alias_of to create it",
                    ));
                }
                ensure_no_params(component, &field)?;
            }
            ComponentRegistration::Make(kind) => {
                if !known.insert(component.name.as_str()) {
                    return Err(ContractError::config_validation(
                        field,
                        "duplicate component name",
                    ));
                }
                validate_params(component, kind, &field)?;
            }
            ComponentRegistration::Alias(source) => {
                if !known.contains(source) {
                    return Err(ContractError::config_validation(
                        format!("{field}.alias_of"),
                        format!("alias source '{source}' not found"),
                    ));
                }
                if !known.insert(component.name.as_str()) {
                    return Err(ContractError::config_validation(
                        field,
                        "duplicate component name",
                    ));
                }
                ensure_no_params(component, &field)?;
            }
        }
    }

    Ok(known)
}

fn ensure_no_params(component: &ComponentConfig, field: &str) -> Result<(), ContractError> {
    if component.params.is_empty() {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            format!("{field}.params"),
            "params are only accepted when creating a component with kind",
        ))
    }
}

/// 校验类型特定参数
fn validate_params(
    component: &ComponentConfig,
    kind: ComponentType,
    field: &str,
) -> Result<(), ContractError> {
    match kind {
        ComponentType::Log => ensure_no_params(component, field),
        ComponentType::File => {
            for (key, value) in &component.params {
                if !FILE_PARAMS.contains(&key.as_str()) {
                    return Err(ContractError::config_validation(
                        format!("{field}.params.{key}"),
                        format!("unknown file parameter, expected one of {FILE_PARAMS:?}"),
                    ));
                }
                if key == "format" && !FILE_FORMATS.contains(&value.as_str()) {
                    return Err(ContractError::config_validation(
                        format!("{field}.params.format"),
                        format!("format must be one of {FILE_FORMATS:?}, got '{value}'"),
                    ));
                }
            }
            Ok(())
        }
    }
}

/// 校验路由
fn validate_routes(blueprint: &RouteBlueprint, known: &HashSet<&str>) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, route) in blueprint.routes.iter().enumerate() {
        if route.id.is_empty() {
            return Err(ContractError::config_validation(
                format!("routes[{idx}].id"),
                "route id cannot be empty",
            ));
        }
        if !seen.insert(route.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("routes[id={}]", route.id),
                "duplicate route id",
            ));
        }
        validate_route(route, known)?;
    }
    Ok(())
}

fn validate_route(route: &RouteConfig, known: &HashSet<&str>) -> Result<(), ContractError> {
    let field = format!("routes[{}]", route.id);

    let timer = route.timer_spec().map_err(|e| {
        ContractError::config_validation(format!("{field}.from"), e.to_string())
    })?;
    if timer.period.is_zero() {
        return Err(ContractError::config_validation(
            format!("{field}.from"),
            "period must be > 0",
        ));
    }

    if route.header.is_empty() {
        return Err(ContractError::config_validation(
            format!("{field}.header"),
            "header name cannot be empty",
        ));
    }

    if route.dispatch_timeout_ms == Some(0) {
        return Err(ContractError::config_validation(
            format!("{field}.dispatch_timeout_ms"),
            "dispatch_timeout_ms must be > 0 when set",
        ));
    }

    if route.to.is_empty() {
        return Err(ContractError::config_validation(
            format!("{field}.to"),
            "route needs at least one sink endpoint",
        ));
    }

    for (idx, uri) in route.to.iter().enumerate() {
        let endpoint: Endpoint = uri.parse().map_err(|e: ContractError| {
            ContractError::config_validation(format!("{field}.to[{idx}]"), e.to_string())
        })?;
        if !known.contains(endpoint.scheme.as_str()) {
            return Err(ContractError::config_validation(
                format!("{field}.to[{idx}]"),
                format!("component '{}' not found", endpoint.scheme),
            ));
        }
        if !endpoint.params.is_empty() {
            return Err(ContractError::config_validation(
                format!("{field}.to[{idx}]"),
                "sink endpoints take no parameters",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn component(name: &str) -> ComponentConfig {
        ComponentConfig {
            name: name.into(),
            kind: None,
            alias_of: None,
            label: None,
            params: HashMap::new(),
        }
    }

    fn minimal_blueprint() -> RouteBlueprint {
        RouteBlueprint {
            version: Default::default(),
            components: vec![
                ComponentConfig {
                    label: Some("log".into()),
                    ..component("log")
                },
                ComponentConfig {
                    kind: Some(ComponentType::Log),
                    label: Some("aaa".into()),
                    ..component("lll")
                },
            ],
            routes: vec![RouteConfig {
                id: "js".into(),
                from: "timer:js?period=1s".into(),
                body: "js".into(),
                header: "RandomValue".into(),
                seed: None,
                dispatch_timeout_ms: None,
                to: vec!["log:js".into(), "lll:js".into()],
            }],
        }
    }

    fn expect_err(bp: &RouteBlueprint, needle: &str) {
        let result = validate(bp);
        assert!(result.is_err(), "expected error containing '{needle}'");
        let err = result.unwrap_err().to_string();
        assert!(err.contains(needle), "got: {err}");
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_alias_config_is_valid() {
        let mut bp = minimal_blueprint();
        bp.components[1] = ComponentConfig {
            alias_of: Some("log".into()),
            label: Some("aaa".into()),
            ..component("lll")
        };
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_duplicate_component() {
        let mut bp = minimal_blueprint();
        bp.components.push(bp.components[1].clone());
        expect_err(&bp, "duplicate component name");
    }

    #[test]
    fn test_make_cannot_shadow_builtin() {
        let mut bp = minimal_blueprint();
        bp.components[1].name = "log".into();
        expect_err(&bp, "duplicate component name");
    }

    #[test]
    fn test_kind_and_alias_conflict() {
        let mut bp = minimal_blueprint();
        bp.components[1].alias_of = Some("log".into());
        expect_err(&bp, "mutually exclusive");
    }

    #[test]
    fn test_unknown_existing_component() {
        let mut bp = minimal_blueprint();
        bp.components.push(component("ghost"));
        expect_err(&bp, "unknown component");
    }

    #[test]
    fn test_alias_source_must_exist() {
        let mut bp = minimal_blueprint();
        bp.components.push(ComponentConfig {
            alias_of: Some("missing".into()),
            ..component("copy")
        });
        expect_err(&bp, "alias source 'missing' not found");
    }

    #[test]
    fn test_empty_label() {
        let mut bp = minimal_blueprint();
        bp.components[0].label = Some(String::new());
        expect_err(&bp, "label cannot be empty");
    }

    #[test]
    fn test_file_params() {
        let mut bp = minimal_blueprint();
        bp.components.push(ComponentConfig {
            kind: Some(ComponentType::File),
            params: HashMap::from([("format".to_string(), "xml".to_string())]),
            ..component("file")
        });
        expect_err(&bp, "format must be one of");

        bp.components[2].params =
            HashMap::from([("compression".to_string(), "gzip".to_string())]);
        expect_err(&bp, "unknown file parameter");

        bp.components[2].params = HashMap::from([
            ("format".to_string(), "json".to_string()),
            ("base_path".to_string(), "/tmp/out".to_string()),
        ]);
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_log_rejects_params() {
        let mut bp = minimal_blueprint();
        bp.components[1]
            .params
            .insert("level".into(), "debug".into());
        expect_err(&bp, "params are only accepted");
    }

    #[test]
    fn test_duplicate_route_id() {
        let mut bp = minimal_blueprint();
        bp.routes.push(bp.routes[0].clone());
        expect_err(&bp, "duplicate route id");
    }

    #[test]
    fn test_zero_period() {
        let mut bp = minimal_blueprint();
        bp.routes[0].from = "timer:js?period=0".into();
        expect_err(&bp, "period must be > 0");
    }

    #[test]
    fn test_from_must_be_timer() {
        let mut bp = minimal_blueprint();
        bp.routes[0].from = "log:js".into();
        expect_err(&bp, "expected 'timer' scheme");
    }

    #[test]
    fn test_unknown_sink_component() {
        let mut bp = minimal_blueprint();
        bp.routes[0].to.push("kafka:js".into());
        expect_err(&bp, "component 'kafka' not found");
    }

    #[test]
    fn test_sink_endpoint_params_rejected() {
        let mut bp = minimal_blueprint();
        bp.routes[0].to[0] = "log:js?level=DEBUG".into();
        expect_err(&bp, "sink endpoints take no parameters");
    }

    #[test]
    fn test_empty_to() {
        let mut bp = minimal_blueprint();
        bp.routes[0].to.clear();
        expect_err(&bp, "at least one sink");
    }

    #[test]
    fn test_zero_dispatch_timeout() {
        let mut bp = minimal_blueprint();
        bp.routes[0].dispatch_timeout_ms = Some(0);
        expect_err(&bp, "dispatch_timeout_ms must be > 0");
    }
}
