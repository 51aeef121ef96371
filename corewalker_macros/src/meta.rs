use syn::{Attribute, Lit, Meta, NestedMeta, Result};

/// Finds `#[<name>(...)]` among a derive input's attributes and returns its
/// parenthesized key/value list, if present.
pub(crate) fn find_helper_attr(
    attrs: &[Attribute],
    name: &str,
) -> Result<Option<Vec<NestedMeta>>> {
    for attr in attrs {
        if !attr.path.is_ident(name) {
            continue;
        }
        match attr.parse_meta()? {
            Meta::List(list) => return Ok(Some(list.nested.into_iter().collect())),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    format!("expected #[{}(key = value, ...)]", name),
                ))
            }
        }
    }
    Ok(None)
}

fn find_value<'a>(nested: &'a [NestedMeta], key: &str) -> Option<&'a Lit> {
    nested.iter().find_map(|item| match item {
        NestedMeta::Meta(Meta::NameValue(kv)) if kv.path.is_ident(key) => Some(&kv.lit),
        _ => None,
    })
}

pub(crate) fn lit_str(nested: &[NestedMeta], key: &str) -> Result<String> {
    match find_value(nested, key) {
        Some(Lit::Str(s)) => Ok(s.value()),
        Some(other) => Err(syn::Error::new_spanned(
            other,
            format!("expected `{} = \"...\"`", key),
        )),
        None => Ok(String::new()),
    }
}

pub(crate) fn lit_int(nested: &[NestedMeta], key: &str) -> Result<usize> {
    match find_value(nested, key) {
        Some(Lit::Int(i)) => i.base10_parse::<usize>(),
        Some(other) => Err(syn::Error::new_spanned(
            other,
            format!("expected `{} = <integer>`", key),
        )),
        None => Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            format!("missing required key `{}`", key),
        )),
    }
}
