//! Fusión determinista de valores JSON, con la semántica de los ficheros
//! de values: el último gana clave a clave.

use serde_json::Value;

/// Merge recursivo: objetos se fusionan clave a clave, cualquier otro valor
/// de `b` (arrays incluidos) reemplaza al de `a`.
pub fn deep_merge(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Object(ma), Value::Object(mb)) => {
            let mut out = ma.clone();
            for (k, vb) in mb.iter() {
                let merged = match out.get(k) {
                    Some(va) => deep_merge(va, vb),
                    None => vb.clone(),
                };
                out.insert(k.clone(), merged);
            }
            Value::Object(out)
        }
        (_, other) => other.clone(),
    }
}
