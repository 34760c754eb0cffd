//! Macro para declarar steps tipados sencillos (cuerpo infalible, salida
//! entera).
//!
//!   use wurzel_core::typed_step;

/// Declara un step tipado.
///
/// Formas soportadas:
/// - `leaf Name { output: Ty, run(me) { .. } }`
/// - `leaf Name { settings: S, output: Ty, run(me) { .. } }`
/// - `step Name { input: In, output: Out, run(me, inp) { .. } }`
/// - `step Name { settings: S, input: In, output: Out, run(me, inp) { .. } }`
///
/// `me` es el nombre con el que el bloque ve `&mut self` (no puede ser
/// `self`). Con `settings` el struct guarda el valor validado en
/// `me.settings`. El bloque devuelve directamente el valor de salida.
#[macro_export]
macro_rules! typed_step {
    // ---------------- Hoja sin settings ----------------
    (
        leaf $name:ident {
            output: $out:ty,
            run($self_ident:ident) $body:block
        }
    ) => {
        #[derive(Clone, Debug, Default)]
        pub struct $name;
        impl $crate::step::TypedStep for $name {
            type Settings = $crate::settings::NoSettings;
            type Input = $crate::contract::NoInput;
            type Output = $out;
            fn create(_settings: Self::Settings) -> Result<Self, $crate::errors::StepError> { Ok(Self) }
            fn run(&mut self, _input: Self::Input) -> Result<$crate::step::StepOutput<Self::Output>, $crate::errors::StepError> {
                let $self_ident = self;
                let _ = &$self_ident;
                let out: Self::Output = { $body };
                Ok($crate::step::StepOutput::Whole(out))
            }
        }
    };

    // ---------------- Hoja con settings ----------------
    (
        leaf $name:ident {
            settings: $settings:ty,
            output: $out:ty,
            run($self_ident:ident) $body:block
        }
    ) => {
        #[derive(Clone, Debug)]
        pub struct $name { pub settings: $settings }
        impl $crate::step::TypedStep for $name {
            type Settings = $settings;
            type Input = $crate::contract::NoInput;
            type Output = $out;
            fn create(settings: Self::Settings) -> Result<Self, $crate::errors::StepError> { Ok(Self { settings }) }
            fn run(&mut self, _input: Self::Input) -> Result<$crate::step::StepOutput<Self::Output>, $crate::errors::StepError> {
                let $self_ident = self;
                let out: Self::Output = { $body };
                Ok($crate::step::StepOutput::Whole(out))
            }
        }
    };

    // ---------------- Step con input, sin settings ----------------
    (
        step $name:ident {
            input: $inp:ty,
            output: $out:ty,
            run($self_ident:ident, $inp_ident:ident) $body:block
        }
    ) => {
        #[derive(Clone, Debug, Default)]
        pub struct $name;
        impl $crate::step::TypedStep for $name {
            type Settings = $crate::settings::NoSettings;
            type Input = $inp;
            type Output = $out;
            fn create(_settings: Self::Settings) -> Result<Self, $crate::errors::StepError> { Ok(Self) }
            fn run(&mut self, $inp_ident: Self::Input) -> Result<$crate::step::StepOutput<Self::Output>, $crate::errors::StepError> {
                let $self_ident = self;
                let _ = &$self_ident;
                let out: Self::Output = { $body };
                Ok($crate::step::StepOutput::Whole(out))
            }
        }
    };

    // ---------------- Step con input y settings ----------------
    (
        step $name:ident {
            settings: $settings:ty,
            input: $inp:ty,
            output: $out:ty,
            run($self_ident:ident, $inp_ident:ident) $body:block
        }
    ) => {
        #[derive(Clone, Debug)]
        pub struct $name { pub settings: $settings }
        impl $crate::step::TypedStep for $name {
            type Settings = $settings;
            type Input = $inp;
            type Output = $out;
            fn create(settings: Self::Settings) -> Result<Self, $crate::errors::StepError> { Ok(Self { settings }) }
            fn run(&mut self, $inp_ident: Self::Input) -> Result<$crate::step::StepOutput<Self::Output>, $crate::errors::StepError> {
                let $self_ident = self;
                let out: Self::Output = { $body };
                Ok($crate::step::StepOutput::Whole(out))
            }
        }
    };
}
