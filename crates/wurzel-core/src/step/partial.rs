use crate::errors::StepError;

/// Recoge los éxitos de un cálculo por item que puede fallar parcialmente.
///
/// Cada fallo se registra como warning. Sólo es error si hubo items y
/// ninguno tuvo éxito.
pub fn collect_partial<T, E, I>(results: I) -> Result<Vec<T>, StepError>
    where I: IntoIterator<Item = Result<T, E>>,
          E: std::fmt::Display
{
    let mut ok = Vec::new();
    let mut failed = 0usize;
    for r in results {
        match r {
            Ok(v) => ok.push(v),
            Err(e) => {
                failed += 1;
                log::warn!("item failed: {e}");
            }
        }
    }
    if ok.is_empty() && failed > 0 {
        return Err(StepError::PartialFailure { failed,
                                               total: failed });
    }
    if failed > 0 {
        log::warn!("{failed} of {} items failed", failed + ok.len());
    }
    Ok(ok)
}
