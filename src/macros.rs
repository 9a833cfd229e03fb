/// Compile a regex literal once and hand out a `&'static Regex`.
macro_rules! regex {
    ($pat:literal) => {{
        static RE: ::once_cell::sync::Lazy<::regex::Regex> =
            ::once_cell::sync::Lazy::new(|| ::regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a [`Rule`](crate::Rule) from its input and instructions.
///
/// ```ignore
/// let rule = rule! {
///     input: "apple",
///     id: "apple-syn",
///     log: "apple synonyms",
///     priority: 10,
///     instructions: [AddSynonym::new("pomme")],
///     properties: { "market": "fr" },
/// };
/// builder.add(rule)?;
/// ```
///
/// `id`, `log`, `priority` and `properties` are optional. Without an `id` the
/// rules collection derives one from the input.
#[macro_export]
macro_rules! rule {
    (
        input: $input:expr
        $(, id: $id:expr)?
        $(, log: $log:expr)?
        $(, priority: $priority:expr)?
        , instructions: [ $($instr:expr),* $(,)? ]
        $(, properties: { $($key:literal : $value:expr),* $(,)? })?
        $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut properties = $crate::Properties::new();
        $(
            properties.insert($crate::PROPERTY_LOG_MESSAGE.to_string(), $crate::PropertyValue::from($log));
        )?
        $(
            properties.insert($crate::PROPERTY_PRIORITY.to_string(), $crate::PropertyValue::from($priority));
        )?
        $($(
            properties.insert($key.to_string(), $crate::PropertyValue::from($value));
        )*)?
        let id: ::std::string::String = { ::std::string::String::new() $(+ $id)? };
        $crate::Rule {
            input: ::std::string::String::from($input),
            instructions: $crate::Instructions::new(
                id,
                vec![ $(::std::boxed::Box::new($instr) as ::std::boxed::Box<dyn $crate::Instruction>),* ],
                properties,
            ),
        }
    }};
}
