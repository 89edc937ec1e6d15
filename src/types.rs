/// File identity stored in the `file_name` column (the source path as text).
/// Example: `/data/minisrc/project_a/Foo.java`
pub type FileName = String;
/// Name of the label column for one labeling task.
/// Examples: `readable`, `compiles`
pub type LabelName = String;
/// One permissible label value.
/// Examples: `readable`, `unreadable`
pub type LabelValue = String;
/// Raw source text of a labeled file.
pub type SourceText = String;
/// Compile result rendered from the metadata file.
/// Examples: `success`, `{"errors":3}`
pub type CompileResult = String;
